pub mod vaults {
    pub mod v1 {
        include!(concat!(env!("OUT_DIR"), "/vaults.v1.rs"));
    }
}
