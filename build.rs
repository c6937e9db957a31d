fn main() {
    // ESP-IDF toolchain environment is only needed for the firmware build;
    // host builds (tests, fuzzing) run with `--no-default-features`.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
