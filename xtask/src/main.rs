/// Packages the plugin with nih_plug_xtask's `bundle` subcommand:
///
///   cargo xtask bundle dopo-delay --release
///
/// The `.vst3` and `.clap` bundles end up in `target/bundled/`.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
