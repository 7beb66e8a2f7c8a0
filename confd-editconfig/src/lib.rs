//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

//! Edit-Config (spec §4.J): parses a NETCONF-style `<config>` payload and
//! applies it to a scratch copy of a session's candidate, promoting it
//! back only once `test-option` and `error-option` both say to.

pub mod apply;
pub mod error;
pub mod operation;
pub mod xml;

pub use apply::{edit_config, Accounted, EditConfigOutcome};
pub use error::Error;
pub use operation::{DefaultOperation, EffectiveOp, ErrorOption, Operation, TestOption};

#[cfg(test)]
mod tests {
    use confd_schema::fixtures::sample_schema;
    use confd_tree::Tree;
    use confd_utils::{AllowAllAuthorizer, Context, Path};

    use super::*;

    fn ctx() -> Context {
        Context::internal()
    }

    #[test]
    fn scenario_1_create_ospf_area_with_networks() {
        let schema = sample_schema();
        let running = Tree::new();
        let mut candidate = Tree::new();
        let authz = AllowAllAuthorizer;

        let xml = r#"<config>
            <protocols xmlns="test-protocols">
                <ospf>
                    <area>
                        <area-id>0</area-id>
                        <network>10.1.1.0/24</network>
                        <network>10.1.2.0/24</network>
                    </area>
                </ospf>
            </protocols>
        </config>"#;

        let outcome = edit_config(
            &ctx(),
            &mut candidate,
            &running,
            &schema,
            &authz,
            xml,
            DefaultOperation::Merge,
            TestOption::TestThenSet,
            ErrorOption::StopOnError,
        )
        .unwrap();

        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        assert!(outcome.promoted);
        assert!(candidate.exists(&schema, &Path::parse("protocols/ospf/area/0")).unwrap());
        let node = candidate.get(&schema, &Path::parse("protocols/ospf/area/0/network")).unwrap();
        assert_eq!(node.as_leaf_list(), Some(&["10.1.1.0/24".to_owned(), "10.1.2.0/24".to_owned()][..]));
    }

    #[test]
    fn scenario_2_replace_moves_an_area_s_networks() {
        let schema = sample_schema();
        let mut running = Tree::new();
        running.create_list_entry(&schema, &Path::parse("protocols/ospf/area"), &["0".into()]).unwrap();
        running.leaf_list_insert(&schema, &Path::parse("protocols/ospf/area/0/network"), "10.1.1.0/24").unwrap();
        let mut candidate = Tree::new();
        let authz = AllowAllAuthorizer;

        let xml = r#"<config xmlns:xc="urn:ietf:params:xml:ns:netconf:base:1.0">
            <protocols xmlns="test-protocols">
                <ospf>
                    <area xc:operation="replace">
                        <area-id>0</area-id>
                        <network>10.9.9.0/24</network>
                    </area>
                </ospf>
            </protocols>
        </config>"#;

        let outcome = edit_config(
            &ctx(),
            &mut candidate,
            &running,
            &schema,
            &authz,
            xml,
            DefaultOperation::Merge,
            TestOption::TestThenSet,
            ErrorOption::StopOnError,
        )
        .unwrap();

        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        let merged = Tree::merge(&candidate, &running, &schema, false);
        let networks = merged.get(&schema, &Path::parse("protocols/ospf/area/0/network")).unwrap();
        assert_eq!(networks.as_leaf_list(), Some(&["10.9.9.0/24".to_owned()][..]));
    }

    #[test]
    fn create_on_an_existing_node_fails_and_leaves_candidate_untouched() {
        let schema = sample_schema();
        let mut running = Tree::new();
        running.set_leaf(&schema, &Path::parse("mtu"), Some("9000")).unwrap();
        let mut candidate = Tree::new();
        let authz = AllowAllAuthorizer;

        let xml = r#"<config xmlns:xc="urn:ietf:params:xml:ns:netconf:base:1.0">
            <mtu xc:operation="create">9000</mtu>
        </config>"#;

        let outcome = edit_config(
            &ctx(),
            &mut candidate,
            &running,
            &schema,
            &authz,
            xml,
            DefaultOperation::Merge,
            TestOption::TestThenSet,
            ErrorOption::StopOnError,
        )
        .unwrap();

        assert!(!outcome.errors.is_empty());
        assert!(!outcome.promoted);
        assert_eq!(candidate, Tree::new());
    }

    #[test]
    fn test_only_never_promotes_even_on_success() {
        let schema = sample_schema();
        let running = Tree::new();
        let mut candidate = Tree::new();
        let authz = AllowAllAuthorizer;

        let xml = r#"<config><mtu>9000</mtu></config>"#;

        let outcome = edit_config(
            &ctx(),
            &mut candidate,
            &running,
            &schema,
            &authz,
            xml,
            DefaultOperation::Merge,
            TestOption::TestOnly,
            ErrorOption::StopOnError,
        )
        .unwrap();

        assert!(outcome.errors.is_empty());
        assert!(!outcome.promoted);
        assert_eq!(candidate, Tree::new());
    }

    #[test]
    fn rollback_on_error_discards_every_op_in_the_request_on_first_failure() {
        let schema = sample_schema();
        let mut running = Tree::new();
        running.set_leaf(&schema, &Path::parse("mtu"), Some("9000")).unwrap();
        let mut candidate = Tree::new();
        let authz = AllowAllAuthorizer;

        // `p` is created fine; `mtu create` fails since running already
        // carries it, so the whole request (including the otherwise
        // successful `p`) is expected to roll back.
        let xml = r#"<config xmlns:xc="urn:ietf:params:xml:ns:netconf:base:1.0">
            <p/>
            <mtu xc:operation="create">9000</mtu>
        </config>"#;

        let outcome = edit_config(
            &ctx(),
            &mut candidate,
            &running,
            &schema,
            &authz,
            xml,
            DefaultOperation::Merge,
            TestOption::Set,
            ErrorOption::RollbackOnError,
        )
        .unwrap();

        assert!(!outcome.errors.is_empty());
        assert!(!outcome.promoted);
        assert_eq!(candidate, Tree::new());
    }

    #[test]
    fn default_operation_none_descends_without_touching_the_waypoint() {
        let schema = sample_schema();
        let running = Tree::new();
        let mut candidate = Tree::new();
        let authz = AllowAllAuthorizer;

        let xml = r#"<config>
            <protocols xmlns="test-protocols">
                <ospf>
                    <area>
                        <area-id>0</area-id>
                        <network>10.1.1.0/24</network>
                    </area>
                </ospf>
            </protocols>
        </config>"#;

        let outcome = edit_config(
            &ctx(),
            &mut candidate,
            &running,
            &schema,
            &authz,
            xml,
            DefaultOperation::None,
            TestOption::Set,
            ErrorOption::StopOnError,
        )
        .unwrap();

        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        assert!(candidate.exists(&schema, &Path::parse("protocols/ospf/area/0")).unwrap());
    }
}
