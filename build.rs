fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let now = time::OffsetDateTime::now_utc();
    let date_fmt = time::format_description::parse("[year]-[month]-[day]")
        .expect("valid date format");

    let date = now.format(&date_fmt).unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=SIMVIEW_BUILD_DATE={}", date);
}
