fn main() {
    if let Err(err) = ware_review::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
