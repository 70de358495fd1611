pub fn run() -> anyhow::Result<()> {
    println!("aidroute {}", env!("CARGO_PKG_VERSION"));
    println!("AID routing table planner for NFC card emulation");
    Ok(())
}
