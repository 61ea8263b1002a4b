//! Static reading guides listed by `/api/guides`.

use serde::Serialize;

/// A named link to background reading.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Guide {
    pub name: &'static str,
    pub url: &'static str,
    pub description: &'static str,
}

pub const GUIDES: &[Guide] = &[
    Guide {
        name: "Address Space Model",
        url: "https://reference.opcfoundation.org/Core/Part3/",
        description: "Nodes, node classes, references and the rules that tie them together.",
    },
    Guide {
        name: "Information Model",
        url: "https://reference.opcfoundation.org/Core/Part5/",
        description: "Standard object, variable and reference types defined by the base model.",
    },
    Guide {
        name: "NodeSet XML Schema",
        url: "https://reference.opcfoundation.org/Core/Part6/",
        description: "Layout of NodeSet2 documents: namespaces, aliases and node sections.",
    },
    Guide {
        name: "Companion Specifications",
        url: "https://github.com/OPCFoundation/UA-Nodeset",
        description: "Published NodeSet files for devices, machinery and industry domains.",
    },
];
