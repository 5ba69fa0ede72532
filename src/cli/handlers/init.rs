use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::board_io;
use crate::ops::templates::StatusTemplateRegistry;

/// Turn a directory name like `mobile-app_v2` into `Mobile App V2`
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn cmd_init(args: InitArgs, root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let registry = StatusTemplateRegistry::builtin();
    let template = registry.get_template(&args.template)?;

    // Nested boards are allowed, but say so
    if let Some(parent) = root.parent()
        && let Ok(outer) = board_io::discover_board(parent)
    {
        eprintln!("Note: enclosing board found at {}/", outer.board_dir.display());
    }

    let name = args.name.unwrap_or_else(|| {
        root.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Untitled".to_string())
    });

    board_io::init_board(root, &name, &template.id, args.force)?;
    println!("Initialized board: {}", name);
    println!("  template: {} ({})", template.name, template.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_name_title_cases_words() {
        assert_eq!(infer_name("mobile-app_v2"), "Mobile App V2");
        assert_eq!(infer_name("ops"), "Ops");
        assert_eq!(infer_name("--"), "");
    }
}
