fn main() -> anyhow::Result<()> {
    mrbc_bindgen::run()
}
