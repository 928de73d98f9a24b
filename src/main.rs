fn main() {
    if let Err(err) = mosaic_figure::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
