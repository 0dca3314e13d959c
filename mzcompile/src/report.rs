//! Assembly of the human readable compilation report.

use itertools::Itertools;

use crate::metadata::{FileEntry, RootInfo, SoftwareEntry, resolve_software};

/// Cross reference the decoded metadata sections into newline-delimited text
/// for direct human display.
///
/// The output order is stable: the optional project name first, then every
/// file in list order with its path and identifier, then per protocol in
/// order the software it was run with (blank when the reference does not
/// resolve), its enzymes space-joined (omitted when there are none) and one
/// `<massDelta>@<residues>` line per modification (omitted when there are
/// none). A file referencing several protocols gets one `used software` line
/// per protocol.
pub fn build_report(root: &RootInfo, files: &[FileEntry], software: &[SoftwareEntry]) -> String {
    let mut lines = Vec::new();

    if let Some(project_name) = &root.project_name {
        lines.push(format!("project name: {project_name}"));
    }

    for file in files {
        lines.push(format!("file: {}", file.name));
        lines.push(format!("\tpath: {}", file.file_path));
        lines.push(format!("\tID: {}", file.id));

        for protocol in &file.protocols {
            let software_name = resolve_software(software, &protocol.software_ref)
                .and_then(|entry| entry.name.as_deref())
                .unwrap_or_default();
            lines.push(format!("\tused software: {software_name}"));

            if !protocol.enzymes.is_empty() {
                lines.push(format!(
                    "\tenzymes: {}",
                    protocol.enzymes.iter().join(" ")
                ));
            }
            for modification in &protocol.modifications {
                lines.push(format!(
                    "\t{}@{}",
                    modification.mass_delta, modification.residues
                ));
            }
        }
    }

    if lines.is_empty() {
        String::new()
    } else {
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

#[cfg(test)]
mod tests {
    use super::build_report;
    use crate::metadata::{FileEntry, ModificationEntry, ProtocolEntry, RootInfo, SoftwareEntry};

    fn mascot() -> SoftwareEntry {
        SoftwareEntry {
            id: "software_1".to_string(),
            name: Some("Mascot".to_string()),
        }
    }

    #[test]
    fn empty_metadata_renders_an_empty_report() {
        assert_eq!(build_report(&RootInfo::default(), &[], &[]), "");
    }

    #[test]
    fn project_name_comes_first() {
        let root = RootInfo {
            project_name: Some("yeast lysate".to_string()),
        };
        assert_eq!(build_report(&root, &[], &[]), "project name: yeast lysate\n");
    }

    #[test]
    fn one_software_line_per_protocol() {
        let file = FileEntry {
            id: "1".to_string(),
            name: "run 1".to_string(),
            file_path: "/data/run1.mzid".to_string(),
            protocols: vec![
                ProtocolEntry {
                    software_ref: "software_1".to_string(),
                    enzymes: vec!["Trypsin".to_string(), "Chymotrypsin".to_string()],
                    modifications: vec![ModificationEntry {
                        mass_delta: 57.021464,
                        residues: "C".to_string(),
                    }],
                },
                ProtocolEntry {
                    software_ref: "software_1".to_string(),
                    enzymes: Vec::new(),
                    modifications: Vec::new(),
                },
            ],
        };

        let report = build_report(&RootInfo::default(), &[file], &[mascot()]);
        assert_eq!(
            report,
            "file: run 1\n\
             \tpath: /data/run1.mzid\n\
             \tID: 1\n\
             \tused software: Mascot\n\
             \tenzymes: Trypsin Chymotrypsin\n\
             \t57.021464@C\n\
             \tused software: Mascot\n"
        );
    }

    #[test]
    fn unresolved_software_reference_renders_blank() {
        let file = FileEntry {
            id: "2".to_string(),
            name: "run 2".to_string(),
            file_path: "/data/run2.mzid".to_string(),
            protocols: vec![ProtocolEntry {
                software_ref: "software_404".to_string(),
                enzymes: Vec::new(),
                modifications: Vec::new(),
            }],
        };

        let report = build_report(&RootInfo::default(), &[file], &[mascot()]);
        assert!(report.contains("\tused software: \n"));
    }

    #[test]
    fn nameless_software_renders_blank() {
        let file = FileEntry {
            id: "3".to_string(),
            name: "run 3".to_string(),
            file_path: "/data/run3.mzid".to_string(),
            protocols: vec![ProtocolEntry {
                software_ref: "software_9".to_string(),
                enzymes: Vec::new(),
                modifications: Vec::new(),
            }],
        };
        let nameless = SoftwareEntry {
            id: "software_9".to_string(),
            name: None,
        };

        let report = build_report(&RootInfo::default(), &[file], &[nameless]);
        assert!(report.contains("\tused software: \n"));
    }
}
