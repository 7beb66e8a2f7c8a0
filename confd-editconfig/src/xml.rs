//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

//! Parses a NETCONF-style `<config>` payload (spec §4.J, §6 "Edit-Config
//! payload") into a small in-memory tree the apply engine walks. Grounded
//! on the teacher's own `xml::reader` usage (`holo-cli/src/token_xml.rs`)
//! for the event-loop shape; this reader additionally tracks per-element
//! namespace and the NETCONF base `xc:operation` attribute.

use xml::reader::XmlEvent;
use xml::ParserConfig;

use crate::error::Error;
use crate::operation::Operation;

/// The NETCONF 1.0 base namespace carrying the `operation` attribute
/// (spec §6 "Edit-Config payload").
pub const NETCONF_BASE_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

/// One parsed `<config>` element: its own namespace/operation plus its
/// children, in document order. Character data is only meaningful for
/// leaf-shaped elements (no element children); `text` carries it trimmed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigElement {
    pub local_name: String,
    pub namespace: Option<String>,
    pub operation: Option<Operation>,
    pub text: Option<String>,
    pub children: Vec<ConfigElement>,
}

/// Parses `xml` into the forest of top-level elements under `<config>`.
/// The document's own root element (conventionally `<config>`) is
/// unwrapped; its children are what `apply` operates on.
pub fn parse(xml: &str) -> Result<Vec<ConfigElement>, Error> {
    let reader = ParserConfig::new().trim_whitespace(true).create_reader(xml.as_bytes());

    let mut stack: Vec<ConfigElement> = Vec::new();
    let mut roots: Vec<ConfigElement> = Vec::new();
    let mut depth = 0usize;

    for event in reader {
        match event.map_err(Error::Xml)? {
            XmlEvent::StartElement { name, attributes, .. } => {
                let operation = attributes
                    .iter()
                    .find(|a| a.name.local_name == "operation" && a.name.namespace.as_deref() == Some(NETCONF_BASE_NS))
                    .map(|a| Operation::parse(&a.value))
                    .transpose()?;
                stack.push(ConfigElement {
                    local_name: name.local_name,
                    namespace: name.namespace,
                    operation,
                    text: None,
                    children: Vec::new(),
                });
                depth += 1;
            }
            XmlEvent::EndElement { .. } => {
                depth -= 1;
                let element = stack.pop().expect("balanced by the XML parser");
                if depth == 0 {
                    // Closed the synthetic document root (`<config>`):
                    // its children are the payload's top-level elements.
                    roots = element.children;
                } else if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            XmlEvent::Characters(text) | XmlEvent::CData(text) => {
                if let Some(top) = stack.last_mut() {
                    let text = text.trim();
                    if !text.is_empty() {
                        top.text = Some(match top.text.take() {
                            Some(existing) => existing + text,
                            None => text.to_owned(),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    Ok(roots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_leaf_with_operation_and_namespace() {
        let xml = r#"<config xmlns:xc="urn:ietf:params:xml:ns:netconf:base:1.0">
            <protocols xmlns="test-protocols">
                <ospf>
                    <area xc:operation="create">
                        <area-id>0</area-id>
                        <network>10.1.1.0/24</network>
                    </area>
                </ospf>
            </protocols>
        </config>"#;

        let roots = parse(xml).unwrap();
        assert_eq!(roots.len(), 1);
        let protocols = &roots[0];
        assert_eq!(protocols.local_name, "protocols");
        assert_eq!(protocols.namespace.as_deref(), Some("test-protocols"));

        let ospf = &protocols.children[0];
        let area = &ospf.children[0];
        assert_eq!(area.operation, Some(Operation::Create));
        assert_eq!(area.children[0].local_name, "area-id");
        assert_eq!(area.children[0].text.as_deref(), Some("0"));
    }

    #[test]
    fn an_unrecognized_operation_value_is_an_error() {
        let xml = r#"<config xmlns:xc="urn:ietf:params:xml:ns:netconf:base:1.0">
            <x xc:operation="bogus"/>
        </config>"#;
        assert!(parse(xml).is_err());
    }
}
