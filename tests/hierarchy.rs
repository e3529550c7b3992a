//! Introspection: tree reconstruction, descriptor fidelity, sharing, and
//! cycle detection.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use strata::{convert_with, hierarchy, DynMiddleware, Error, If, Meta, Middleware, Next, Stack};

struct Ctx;

async fn noop(_ctx: &mut Ctx) -> Result<(), Error> {
    Ok(())
}

#[test]
fn reconstructs_the_registration_shape() {
    let audit = Stack::named("audit").with_meta(noop, Meta::named("log"));
    let app = Stack::named("app")
        .with_meta(noop, Meta::named("validate"))
        .with_meta(noop, Meta::named("gate"))
        .with(audit);

    let tree = hierarchy(&app).unwrap();

    assert_eq!(tree.meta, Some(Meta::named("app")));
    assert_eq!(tree.children.len(), 3);
    assert_eq!(tree.children[0].meta, Some(Meta::named("validate")));
    assert_eq!(tree.children[1].meta, Some(Meta::named("gate")));
    assert!(tree.children[0].children.is_empty());

    let nested = &tree.children[2];
    assert_eq!(nested.meta, Some(Meta::named("audit")));
    assert_eq!(nested.children.len(), 1);
    assert_eq!(nested.children[0].meta, Some(Meta::named("log")));
}

#[test]
fn descriptor_fields_survive_the_walk() {
    let app = Stack::<Ctx>::new().with_meta(noop, Meta::named("validate").field("stage", "pre"));

    let tree = hierarchy(&app).unwrap();

    let meta = tree.children[0].meta.as_ref().unwrap();
    assert_eq!(meta.get("stage"), Some("pre"));
}

#[test]
fn unannotated_units_appear_without_identifying_info() {
    let app = Stack::<Ctx>::new().with(noop);

    let tree = hierarchy(&app).unwrap();

    assert_eq!(tree.meta, None);
    assert_eq!(tree.children.len(), 1);
    assert_eq!(tree.children[0].meta, None);
}

#[test]
fn combinators_expose_their_inner_sequence() {
    let guard = If::new(|_: &Ctx| true, Stack::new().with_meta(noop, Meta::named("log")))
        .annotate(Meta::named("guard"));

    let tree = hierarchy(&guard).unwrap();

    assert_eq!(tree.meta, Some(Meta::named("guard")));
    assert_eq!(tree.children.len(), 1);
    assert_eq!(tree.children[0].meta, Some(Meta::named("log")));
}

#[test]
fn the_tree_serializes_with_empty_parts_omitted() {
    let app = Stack::named("app")
        .with_meta(noop, Meta::named("validate"))
        .with(noop);

    let tree = hierarchy(&app).unwrap();
    let json = serde_json::to_value(&tree).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "meta": { "name": "app" },
            "children": [
                { "meta": { "name": "validate" } },
                {}
            ]
        })
    );
}

#[test]
fn sharing_one_unit_across_positions_is_not_a_cycle() {
    let shared = convert_with(noop, Meta::named("shared"));
    let app = Stack::new().with(shared.clone()).with(shared);

    let tree = hierarchy(&app).unwrap();

    assert_eq!(tree.children.len(), 2);
    assert_eq!(tree.children[0].meta, Some(Meta::named("shared")));
    assert_eq!(tree.children[1].meta, Some(Meta::named("shared")));
}

/// A unit that can be made to contain itself. The crate's own builders
/// consume values and cannot produce this; it takes a hand-written impl
/// with interior mutability.
struct Cyclic {
    inner: OnceLock<Vec<DynMiddleware<Ctx>>>,
}

#[async_trait]
impl Middleware<Ctx> for Cyclic {
    async fn process(&self, ctx: &mut Ctx, next: Next<'_, Ctx>) -> Result<(), Error> {
        next.run(ctx).await
    }

    fn stack(&self) -> &[DynMiddleware<Ctx>] {
        self.inner.get().map(Vec::as_slice).unwrap_or(&[])
    }
}

#[test]
fn self_containment_faults_instead_of_recursing() {
    let node = Arc::new(Cyclic { inner: OnceLock::new() });
    let unit: DynMiddleware<Ctx> = node.clone();
    let _ = node.inner.set(vec![unit]);

    assert!(matches!(hierarchy(node.as_ref()), Err(Error::Cycle)));
}
