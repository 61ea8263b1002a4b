//! Hand-curated catalog entries shipped with the binary.

use crate::config::DEFAULT_RAW_BASE_URL;
use crate::model::CatalogEntry;

struct Builtin {
    slug: &'static str,
    name: &'static str,
    description: &'static str,
    category: &'static str,
    path: &'static str,
    namespace: &'static str,
    documentation_url: &'static str,
    tags: &'static [&'static str],
    dependencies: &'static [&'static str],
    default_selection: bool,
}

const BUILTINS: &[Builtin] = &[
    Builtin {
        slug: "core",
        name: "OPC UA Core",
        description: "Base information model: object, variable and reference types every server exposes.",
        category: "Core",
        path: "Schema/Opc.Ua.NodeSet2.xml",
        namespace: "http://opcfoundation.org/UA/",
        documentation_url: "https://reference.opcfoundation.org/Core/Part5/",
        tags: &["base", "core", "types"],
        dependencies: &[],
        default_selection: true,
    },
    Builtin {
        slug: "di",
        name: "Devices (DI)",
        description: "Device integration model: devices, components, configuration and parameter sets.",
        category: "Core",
        path: "DI/Opc.Ua.Di.NodeSet2.xml",
        namespace: "http://opcfoundation.org/UA/DI/",
        documentation_url: "https://reference.opcfoundation.org/DI/",
        tags: &["device", "di", "topology"],
        dependencies: &["core"],
        default_selection: true,
    },
    Builtin {
        slug: "ia",
        name: "Industrial Automation (IA)",
        description: "Shared building blocks for automation companion specifications.",
        category: "Automation",
        path: "IA/Opc.Ua.IA.NodeSet2.xml",
        namespace: "http://opcfoundation.org/UA/IA/",
        documentation_url: "https://reference.opcfoundation.org/IA/",
        tags: &["automation", "ia"],
        dependencies: &["core", "di"],
        default_selection: false,
    },
    Builtin {
        slug: "machinery",
        name: "Machinery",
        description: "Machine identification, component and state building blocks.",
        category: "Machinery",
        path: "Machinery/Opc.Ua.Machinery.NodeSet2.xml",
        namespace: "http://opcfoundation.org/UA/Machinery/",
        documentation_url: "https://reference.opcfoundation.org/Machinery/",
        tags: &["machine", "machinery", "identification"],
        dependencies: &["core", "di"],
        default_selection: false,
    },
    Builtin {
        slug: "robotics",
        name: "Robotics",
        description: "Motion devices, controllers and safety states for industrial robots.",
        category: "Machinery",
        path: "Robotics/Opc.Ua.Robotics.NodeSet2.xml",
        namespace: "http://opcfoundation.org/UA/Robotics/",
        documentation_url: "https://reference.opcfoundation.org/Robotics/",
        tags: &["robot", "motion"],
        dependencies: &["core", "di"],
        default_selection: false,
    },
    Builtin {
        slug: "machinetool",
        name: "Machine Tools",
        description: "Monitoring of machine tools: production jobs, equipment and notifications.",
        category: "Machinery",
        path: "MachineTool/Opc.Ua.MachineTool.NodeSet2.xml",
        namespace: "http://opcfoundation.org/UA/MachineTool/",
        documentation_url: "https://reference.opcfoundation.org/MachineTool/",
        tags: &["cnc", "machine-tool"],
        dependencies: &["core", "di", "ia", "machinery"],
        default_selection: false,
    },
    Builtin {
        slug: "packml",
        name: "PackML",
        description: "Packaging machine state model and interfaces.",
        category: "Automation",
        path: "PackML/Opc.Ua.PackML.NodeSet2.xml",
        namespace: "http://opcfoundation.org/UA/PackML/",
        documentation_url: "https://reference.opcfoundation.org/PackML/",
        tags: &["packaging", "state-machine"],
        dependencies: &["core"],
        default_selection: false,
    },
    Builtin {
        slug: "padim",
        name: "Process Automation Devices (PA-DIM)",
        description: "Device information model for process automation field devices.",
        category: "Process",
        path: "PADIM/Opc.Ua.PADIM.NodeSet2.xml",
        namespace: "http://opcfoundation.org/UA/PADIM/",
        documentation_url: "https://reference.opcfoundation.org/PADIM/",
        tags: &["process", "field-device"],
        dependencies: &["core", "di"],
        default_selection: false,
    },
];

/// The built-in catalog, in presentation order.
pub fn builtin_entries() -> Vec<CatalogEntry> {
    BUILTINS
        .iter()
        .map(|b| CatalogEntry {
            slug: b.slug.to_string(),
            name: b.name.to_string(),
            description: Some(b.description.to_string()),
            category: Some(b.category.to_string()),
            documentation_url: Some(b.documentation_url.to_string()),
            tags: b.tags.iter().map(|t| t.to_string()).collect(),
            namespace_uris: vec![b.namespace.to_string()],
            source_url: format!("{}/{}", DEFAULT_RAW_BASE_URL, b.path),
            dependencies: b.dependencies.iter().map(|d| d.to_string()).collect(),
            default_selection: b.default_selection,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_slugs_are_unique_and_normalized() {
        let entries = builtin_entries();
        let slugs: HashSet<_> = entries.iter().map(|e| e.key()).collect();
        assert_eq!(slugs.len(), entries.len());
        assert!(entries.iter().all(|e| e.slug == e.key()));
    }

    #[test]
    fn test_core_and_di_are_defaults() {
        let defaults: Vec<_> = builtin_entries()
            .into_iter()
            .filter(|e| e.default_selection)
            .map(|e| e.slug)
            .collect();
        assert_eq!(defaults, vec!["core", "di"]);
    }
}
