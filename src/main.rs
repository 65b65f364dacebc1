fn main() {
    std::process::exit(autovote::run());
}
