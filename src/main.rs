fn main() {
    if let Err(err) = infact::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
