//! Library crate root for the AgentCore CLI.

#[path = "lib/mod.rs"]
pub mod lib_mod;
pub use lib_mod as lib;
pub mod aws;
pub mod cli;
pub mod commands;
pub mod config;

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    #[test]
    fn cli_layout_requires_split_modules() {
        let expected_files = [
            "src/cli/mod.rs",
            "src/cli/handler.rs",
            "src/cli/registry.rs",
            "src/cli/router.rs",
        ];

        for path in expected_files {
            assert!(Path::new(path).exists(), "CLI layout: {} must exist", path);
        }

        let mod_path = Path::new("src/cli/mod.rs");
        let content = fs::read_to_string(mod_path)
            .unwrap_or_else(|_| panic!("CLI layout: failed to read {}", mod_path.display()));

        for needle in ["handler", "registry", "router", "build_app"] {
            assert!(
                content.contains(needle),
                "CLI layout: mod.rs must declare {}",
                needle
            );
        }
    }

    #[test]
    fn command_catalog_has_one_module_per_group() {
        let mod_path = Path::new("src/commands/mod.rs");
        let content = fs::read_to_string(mod_path).unwrap_or_else(|_| {
            panic!("commands layout: failed to read {}", mod_path.display())
        });

        for module in [
            "configure",
            "create",
            "gateway",
            "identity",
            "memory",
            "observability",
            "operation",
            "runtime",
        ] {
            let file = format!("src/commands/{module}.rs");
            assert!(
                Path::new(&file).exists(),
                "commands layout: {} must exist",
                file
            );
            assert!(
                content.contains(&format!("pub mod {module};")),
                "commands layout: mod.rs must declare {}",
                module
            );
        }
    }
}
