//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use confd_schema::{Node as SchemaNode, NodeKind};
use confd_tree::Node;
use xml::writer::{EmitterConfig, EventWriter, XmlEvent};

use crate::error::Error;

/// Output formats for a marshalled subtree (spec §4.C/§6).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encoding {
    /// Compact form used between `confd` components: lists are objects
    /// keyed by their comma-joined key tuple.
    Internal,
    /// RFC 7951-style JSON: lists are arrays, each entry carrying its key
    /// leaves as ordinary elements.
    Json,
    /// XML with a per-module namespace on each top-level-owned element.
    Xml,
}

pub fn marshal(node: &Node, schema_node: &SchemaNode, encoding: Encoding) -> Result<String, Error> {
    match encoding {
        Encoding::Internal => {
            let value = to_json_value(node, schema_node, false);
            serde_json::to_string(&value).map_err(Error::Json)
        }
        Encoding::Json => {
            let value = to_json_value(node, schema_node, true);
            serde_json::to_string(&value).map_err(Error::Json)
        }
        Encoding::Xml => marshal_xml(node, schema_node),
    }
}

fn to_json_value(node: &Node, schema_node: &SchemaNode, rfc7951: bool) -> serde_json::Value {
    match schema_node.kind {
        NodeKind::Leaf => serde_json::Value::String(node.as_leaf_value().unwrap_or("").to_owned()),
        NodeKind::LeafList => serde_json::Value::Array(
            node.as_leaf_list()
                .unwrap_or(&[])
                .iter()
                .map(|v| serde_json::Value::String(v.clone()))
                .collect(),
        ),
        NodeKind::Container => container_to_json(node, schema_node, rfc7951),
        NodeKind::List => {
            let Some((_, entries)) = node.as_list() else {
                return serde_json::Value::Null;
            };
            if rfc7951 {
                serde_json::Value::Array(
                    entries.iter().map(|(_, entry)| container_to_json(entry, schema_node, rfc7951)).collect(),
                )
            } else {
                let mut map = serde_json::Map::new();
                for (keys, entry) in entries {
                    map.insert(keys.join(","), container_to_json(entry, schema_node, rfc7951));
                }
                serde_json::Value::Object(map)
            }
        }
        NodeKind::Choice | NodeKind::Case => unreachable!("transparent nodes are flattened by the caller"),
    }
}

fn container_to_json(node: &Node, schema_node: &SchemaNode, rfc7951: bool) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    insert_children(node, schema_node, rfc7951, &mut map);
    serde_json::Value::Object(map)
}

fn insert_children(node: &Node, schema_node: &SchemaNode, rfc7951: bool, map: &mut serde_json::Map<String, serde_json::Value>) {
    let Some(container) = node.as_container() else { return };
    for child_schema in schema_node.children_in_order() {
        if matches!(child_schema.kind, NodeKind::Choice | NodeKind::Case) {
            insert_children(node, child_schema, rfc7951, map);
            continue;
        }
        let Some(child) = container.get(&child_schema.name) else { continue };
        map.insert(child_schema.name.clone(), to_json_value(child, child_schema, rfc7951));
    }
}

fn marshal_xml(node: &Node, schema_node: &SchemaNode) -> Result<String, Error> {
    let mut buf = Vec::new();
    {
        let mut writer = EmitterConfig::new().perform_indent(false).write_document_declaration(false).create_writer(&mut buf);
        write_xml_children(node, schema_node, &mut writer)?;
    }
    String::from_utf8(buf).map_err(Error::Utf8)
}

fn write_xml_children<W: std::io::Write>(node: &Node, schema_node: &SchemaNode, writer: &mut EventWriter<W>) -> Result<(), Error> {
    let Some(container) = node.as_container() else { return Ok(()) };
    for child_schema in schema_node.children_in_order() {
        if matches!(child_schema.kind, NodeKind::Choice | NodeKind::Case) {
            write_xml_children(node, child_schema, writer)?;
            continue;
        }
        let Some(child) = container.get(&child_schema.name) else { continue };
        write_xml_node(child, child_schema, writer)?;
    }
    Ok(())
}

fn write_xml_node<W: std::io::Write>(node: &Node, schema_node: &SchemaNode, writer: &mut EventWriter<W>) -> Result<(), Error> {
    match schema_node.kind {
        NodeKind::Leaf => {
            write_xml_start(schema_node, writer)?;
            if let Some(value) = node.as_leaf_value() {
                if !value.is_empty() {
                    writer.write(XmlEvent::characters(value)).map_err(Error::Xml)?;
                }
            }
            writer.write(XmlEvent::end_element()).map_err(Error::Xml)?;
        }
        NodeKind::LeafList => {
            for value in node.as_leaf_list().unwrap_or(&[]) {
                write_xml_start(schema_node, writer)?;
                writer.write(XmlEvent::characters(value)).map_err(Error::Xml)?;
                writer.write(XmlEvent::end_element()).map_err(Error::Xml)?;
            }
        }
        NodeKind::Container => {
            write_xml_start(schema_node, writer)?;
            write_xml_children(node, schema_node, writer)?;
            writer.write(XmlEvent::end_element()).map_err(Error::Xml)?;
        }
        NodeKind::List => {
            let Some((_, entries)) = node.as_list() else { return Ok(()) };
            for (_, entry) in entries {
                write_xml_start(schema_node, writer)?;
                write_xml_children(entry, schema_node, writer)?;
                writer.write(XmlEvent::end_element()).map_err(Error::Xml)?;
            }
        }
        NodeKind::Choice | NodeKind::Case => unreachable!("transparent nodes are flattened by the caller"),
    }
    Ok(())
}

fn write_xml_start<W: std::io::Write>(schema_node: &SchemaNode, writer: &mut EventWriter<W>) -> Result<(), Error> {
    match &schema_node.module {
        Some(module) => {
            let ns = format!("urn:confd:{module}");
            writer.write(XmlEvent::start_element(schema_node.name.as_str()).default_ns(ns)).map_err(Error::Xml)
        }
        None => writer.write(XmlEvent::start_element(schema_node.name.as_str())).map_err(Error::Xml),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confd_schema::fixtures::sample_schema;
    use confd_tree::Tree;
    use confd_utils::Path;

    #[test]
    fn internal_encoding_keys_list_by_composite_key() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        let server = Path::parse("server");
        tree.create_list_entry(&schema, &server, &["web1".into(), "10.0.0.1".into()]).unwrap();

        let container = tree.root().as_container().unwrap();
        let list_node = container.get("server").unwrap();
        let server_schema = schema.root().child("server").unwrap();
        let text = marshal(list_node, server_schema, Encoding::Internal).unwrap();
        assert!(text.contains("\"web1,10.0.0.1\""));
    }

    #[test]
    fn json_encoding_renders_list_as_array_with_keys_embedded() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        let area = Path::parse("protocols/ospf/area");
        tree.create_list_entry(&schema, &area, &["0".into()]).unwrap();

        let rendered = marshal(tree.root(), schema.root(), Encoding::Json).unwrap();
        assert!(rendered.contains("\"area-id\":\"0\""));
        assert!(rendered.contains('['));
    }

    #[test]
    fn xml_encoding_carries_module_namespace_on_top_level_element() {
        let schema = sample_schema();
        let mut tree = Tree::new();
        let area = Path::parse("protocols/ospf/area");
        tree.create_list_entry(&schema, &area, &["0".into()]).unwrap();

        let rendered = marshal(tree.root(), schema.root(), Encoding::Xml).unwrap();
        assert!(rendered.contains("<protocols xmlns=\"urn:confd:test-protocols\">"));
        assert!(rendered.contains("<area-id>0</area-id>"));
    }
}
