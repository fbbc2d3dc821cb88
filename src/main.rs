fn main() -> anyhow::Result<()> {
    house_demo::run()
}
