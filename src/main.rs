//! simview - play back simulation result meshes.
//!
//! Usage: `simview [directory]`. Log verbosity follows `RUST_LOG`.

fn main() {
    let dir = std::env::args_os().nth(1).map(std::path::PathBuf::from);

    #[cfg(feature = "viewer")]
    {
        if let Err(e) = simview::viewer::run(dir) {
            eprintln!("Viewer error: {:#}", e);
            std::process::exit(1);
        }
    }
    #[cfg(not(feature = "viewer"))]
    {
        let _ = dir;
        eprintln!("Viewer not available. Rebuild with: cargo build --features viewer");
        std::process::exit(1);
    }
}
