fn main() {
    if let Err(err) = chronometer_lib::run() {
        eprintln!("chronometer: {err:#}");
        std::process::exit(1);
    }
}
