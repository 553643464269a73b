fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/user_directory.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/user_directory.proto");
    println!("cargo:rerun-if-changed=build.rs");

    Ok(())
}
