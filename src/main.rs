fn main() -> anyhow::Result<()> {
    mapbuffers_lib::run()
}
