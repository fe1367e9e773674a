fn main() -> std::io::Result<()> {
    println!("cargo:rerun-if-changed=proto/export.proto");
    prost_build::Config::new().compile_protos(&["proto/export.proto"], &["proto/"])
}
