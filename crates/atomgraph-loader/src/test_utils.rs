//! Test utilities for building atom stores on disk

use std::fs;
use tempfile::TempDir;

/// Create a temporary store with a specific file structure
pub fn create_store_with_structure(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for (path, content) in structure {
        let full_path = root.join(path);

        // Create parent directories if needed
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }

        fs::write(&full_path, content).unwrap();
    }

    temp_dir
}

/// Create a small, fully consistent store: a requirement, its design and a
/// validating procedure, grouped into two modules.
pub fn create_sample_store() -> TempDir {
    create_store_with_structure(&[
        (
            "atoms/requirements/REQ-001.yaml",
            r#"
id: REQ-001
type: requirement
title: Users can reset their password
downstream_ids: [DES-001]
"#,
        ),
        (
            "atoms/designs/DES-001.yaml",
            r#"
id: DES-001
type: design
title: Reset token flow
upstream_ids: [REQ-001]
downstream_ids: [PROC-001]
"#,
        ),
        (
            "atoms/procedures/nested/PROC-001.yml",
            r#"
id: PROC-001
type: procedure
upstream_ids:
  - DES-001
downstream_ids: ~
content: |
  1. Request a reset link
  2. Follow the link
"#,
        ),
        (
            "modules/auth.yaml",
            r#"
module_id: auth
atom_ids: [REQ-001, DES-001]
metadata:
  dependencies: [ops]
"#,
        ),
        (
            "modules/ops.yaml",
            r#"
id: ops
atom_ids: [PROC-001]
"#,
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sample_store() {
        let temp_dir = create_sample_store();
        let root = temp_dir.path();

        assert!(root.join("atoms/requirements/REQ-001.yaml").exists());
        assert!(root.join("atoms/procedures/nested/PROC-001.yml").exists());
        assert!(root.join("modules/auth.yaml").exists());
    }
}
