fn main() {
    // UniFFI scaffolding is generated via proc-macros (uniffi::setup_scaffolding!() in lib.rs),
    // no UDL file needed
    println!("cargo:rerun-if-changed=src/uniffi_bindings.rs");
    println!("cargo:rerun-if-changed=build.rs");
}
