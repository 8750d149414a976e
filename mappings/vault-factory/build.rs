use anyhow::Result;
use std::env;
use std::path::PathBuf;

use substreams_ethereum::Abigen;

fn main() -> Result<()> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    // Compile the entity and event messages
    println!("cargo:rerun-if-changed=../../proto/vaults.proto");
    prost_build::compile_protos(&["../../proto/vaults.proto"], &["../../proto"])?;

    // Generate contract bindings for the factory and its vaults
    for (name, abi) in [("Factory", "abi/factory.json"), ("Vault", "abi/vault.json")] {
        println!("cargo:rerun-if-changed={abi}");
        Abigen::new(name, abi)?
            .generate()?
            .write_to_file(out_dir.join(format!("{}.rs", name.to_lowercase())))?;
    }

    Ok(())
}
