use std::fs;
use std::path::Path;

use crate::io::board_io::BoardIoError;
use crate::model::config::BoardConfig;

/// Read the board config, returning both the parsed config and the raw
/// toml_edit document for round-trip-safe editing.
pub fn read_config(board_dir: &Path) -> Result<(BoardConfig, toml_edit::DocumentMut), BoardIoError> {
    let config_path = board_dir.join("board.toml");
    let config_text = fs::read_to_string(&config_path).map_err(|e| BoardIoError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: BoardConfig = toml::from_str(&config_text)?;
    let doc: toml_edit::DocumentMut = config_text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(board_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), BoardIoError> {
    let config_path = board_dir.join("board.toml");
    fs::write(&config_path, doc.to_string()).map_err(|e| BoardIoError::ReadError {
        path: config_path,
        source: e,
    })?;
    Ok(())
}

/// Set the active template id
pub fn set_active_template(doc: &mut toml_edit::DocumentMut, template_id: &str) {
    if !doc.contains_key("board") {
        doc["board"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["board"]["template"] = toml_edit::value(template_id);
}

/// Set the timeline zoom level
pub fn set_zoom(doc: &mut toml_edit::DocumentMut, level: u8) {
    if !doc.contains_key("timeline") {
        doc["timeline"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["timeline"]["zoom"] = toml_edit::value(i64::from(level));
}
