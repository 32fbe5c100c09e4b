use std::{collections::BTreeSet, path::Path};

use crate::{error::Result, file_utils::write_file_ensuring_parent_dir};

/// Default name of the root class listing, relative to the working directory.
pub const DEFAULT_REPORT_FILE: &str = "SWBF2RootClasses.txt";

/// Newline terminated listing of root class names, in set order.
pub fn format_root_classes(roots: &BTreeSet<String>) -> String {
    let mut out = String::new();
    for root in roots {
        out.push_str(root);
        out.push('\n');
    }
    out
}

pub fn write_root_classes(path: &Path, roots: &BTreeSet<String>) -> Result<()> {
    write_file_ensuring_parent_dir(path, format_root_classes(roots).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::temp_dir::TempDir;

    #[test]
    fn test_format_root_classes() {
        let roots: BTreeSet<String> = ["soldier", "cannon", "soldier"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(format_root_classes(&roots), "cannon\nsoldier\n");
        assert_eq!(format_root_classes(&BTreeSet::new()), "");
    }

    #[test]
    fn test_write_root_classes() {
        let tmp = TempDir::new("swbf2-hierarchy-report");
        let path = tmp.join(DEFAULT_REPORT_FILE);
        let roots = BTreeSet::from(["walker".to_string()]);
        write_root_classes(&path, &roots).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "walker\n");
    }
}
