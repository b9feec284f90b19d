use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    const PROTO: &str = "proto/node.proto";
    println!("cargo:rerun-if-changed={PROTO}");

    // Parsed in-process so no `protoc` is needed on the build host.
    let descriptors = protox::compile([PROTO], ["proto"])?;
    tonic_build::configure()
        .build_server(false)
        .compile_fds(descriptors)?;

    Ok(())
}
