fn main() {
    if let Err(err) = csv_spatial::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
