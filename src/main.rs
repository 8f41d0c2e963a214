fn main() {
    if let Err(err) = tag_arranger::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
