fn main() {
    if let Err(e) = gh_activity_lib::run() {
        eprintln!("gh-activity: {e:#}");
        std::process::exit(1);
    }
}
