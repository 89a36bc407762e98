//! Edge case and stress tests for fos-offscreen
//!
//! Failure paths, lifetime corner cases, and truncation boundaries.

use fos_offscreen::{
    DomError, DoublyLinkedList, Element, ElementHandle, GrowableArray, HostBridge, Name, Sequence,
    SerializerConfig, Strong,
};

// ============================================================================
// FAILED MUTATIONS LEAVE THE TREE UNCHANGED
// ============================================================================

#[test]
fn test_append_with_cycle_changes_nothing() {
    let root = Element::create("div");
    let child = Element::create("div");
    let stray = Element::create("span");
    root.append(&[child.clone()]).unwrap();

    // The valid element before the offending one must not be moved either
    let err = child.append(&[stray.clone(), root.clone()]).unwrap_err();
    assert_eq!(err, DomError::HierarchyRequest);
    assert_eq!(stray.parent_element(), None);
    assert_eq!(child.child_count(), 0);
    assert_eq!(root.child_count(), 1);
}

#[test]
fn test_remove_child_foreign() {
    let parent = Element::create("div");
    let other_parent = Element::create("div");
    let child = Element::create("p");
    other_parent.append(&[child.clone()]).unwrap();

    assert_eq!(parent.remove_child(&child).unwrap_err(), DomError::NotAChild);
    assert_eq!(child.parent_element(), Some(other_parent));
}

#[test]
fn test_replace_with_own_ancestor_rejected() {
    let root = Element::create("div");
    let middle = Element::create("div");
    let leaf = Element::create("div");
    root.append(&[middle.clone()]).unwrap();
    middle.append(&[leaf.clone()]).unwrap();

    assert_eq!(leaf.replace_with(&[root.clone()]), Err(DomError::HierarchyRequest));
    assert_eq!(leaf.parent_element(), Some(middle));
}

#[test]
fn test_replace_with_empty_list_removes() {
    let parent = Element::create("div");
    let child = Element::create("p");
    parent.append(&[child.clone()]).unwrap();

    child.replace_with(&[]).unwrap();
    assert_eq!(parent.child_count(), 0);
    assert_eq!(child.parent_element(), None);
}

#[test]
fn test_append_nothing() {
    let parent = Element::create("div");
    parent.set_text_content("kept");
    parent.append(&[]).unwrap();
    assert_eq!(parent.text_content().as_deref(), Some("kept"));
}

#[test]
fn test_splice_out_of_bounds_leaves_store_untouched() {
    let mut array: GrowableArray<u32> = GrowableArray::new();
    array.push([1u32, 2, 3]).unwrap();
    let err = array
        .splice_items(2, 5, vec![9], &mut |_: u32, _: usize| {})
        .unwrap_err();
    assert_eq!(
        err,
        DomError::SpliceOutOfBounds {
            index: 2,
            delete_count: 5,
            len: 3
        }
    );
    assert_eq!(array.as_slice(), &[1, 2, 3]);

    let mut list: DoublyLinkedList<u32> = DoublyLinkedList::new();
    list.push(1).unwrap();
    assert!(list.splice(4, 0, vec![2]).is_err());
    assert_eq!(Sequence::len(&list), 1);
}

// ============================================================================
// LIFETIMES
// ============================================================================

#[test]
fn test_detached_subtree_finalizes_on_last_release() {
    let root = Element::create("div");
    let child = Element::create("div");
    let grandchild = Element::create("div");
    child.append(&[grandchild.clone()]).unwrap();
    root.append(&[child.clone()]).unwrap();

    let weak_child = child.downgrade();
    let weak_grandchild = grandchild.downgrade();
    drop(child);
    drop(grandchild);
    assert!(!weak_child.is_finalized());

    drop(root);
    assert!(weak_child.is_finalized());
    assert!(weak_grandchild.is_finalized());
}

#[test]
fn test_child_outliving_parent_sees_no_parent() {
    let parent = Element::create("div");
    let child = Element::create("span");
    parent.append(&[child.clone()]).unwrap();

    drop(parent);
    assert_eq!(child.parent_element(), None);
    assert_eq!(child.strong_count(), 1);
    assert_eq!(child.remove(), Err(DomError::Detached));
}

#[test]
fn test_weak_parent_handle_after_finalize() {
    let parent = Element::create("div");
    let child = Element::create("span");
    parent.append(&[child.clone()]).unwrap();
    let weak_parent = parent.downgrade();

    // Keep the parent's block around after finalization
    drop(parent);
    assert!(weak_parent.is_finalized());
    assert!(weak_parent.upgrade().is_none());
    assert_eq!(child.parent_element(), None);
}

#[test]
fn test_text_content_releases_children() {
    let parent = Element::create("div");
    let kept = Element::create("p");
    let dropped_weak = {
        let released = Element::create("p");
        parent.append(&[kept.clone(), released.clone()]).unwrap();
        released.downgrade()
    };
    assert!(!dropped_weak.is_finalized());

    parent.set_text_content("text");
    assert!(dropped_weak.is_finalized());
    assert_eq!(kept.parent_element(), None);
    assert_eq!(parent.first_element_child(), None);
}

#[test]
fn test_weak_only_holder_detects_finalization() {
    let strong = Strong::create(String::from("payload"), drop);
    let weak = strong.downgrade();
    assert_eq!(strong.dec_strong(), 0);
    assert!(weak.is_finalized());
    assert_eq!(weak.strong_count(), 0);
    assert_eq!(weak.dec_weak(), 0);
}

const DEEP_CHAIN: usize = 100_000;

/// Chain of `levels + 1` divs, built from the bottom so every append is O(1).
/// Returns the root and the deepest element.
fn deep_chain(levels: usize) -> (Element, Element) {
    let bottom = Element::create("div");
    let mut top = bottom.clone();
    for _ in 0..levels {
        let parent = Element::create("div");
        parent.append(&[top.clone()]).unwrap();
        top = parent;
    }
    (top, bottom)
}

#[test]
fn test_deep_chain_release() {
    let (root, bottom) = deep_chain(DEEP_CHAIN);
    let weak_bottom = bottom.downgrade();
    let weak_middle = {
        let mut cursor = root.clone();
        for _ in 0..DEEP_CHAIN / 2 {
            cursor = cursor.first_element_child().unwrap();
        }
        cursor.downgrade()
    };
    drop(bottom);

    drop(root);
    assert!(weak_middle.is_finalized());
    assert!(weak_bottom.is_finalized());
}

#[test]
fn test_deep_chain_release_keeps_held_descendant() {
    let (root, bottom) = deep_chain(DEEP_CHAIN);
    let weak_root = root.downgrade();

    drop(root);
    assert!(weak_root.is_finalized());
    assert_eq!(bottom.parent_element(), None);
    assert_eq!(bottom.strong_count(), 1);
}

#[test]
fn test_interned_names_stay_bounded() {
    let baseline = Name::interned_count();
    for round in 0..20 {
        let elements: Vec<Element> = (0..500)
            .map(|n| {
                let element = Element::create(&format!("x-tag-{round}-{n}"));
                element.set_attribute(&format!("data-a{round}-{n}"), "1").unwrap();
                element
                    .set_style_property(&format!("--p{round}-{n}"), "0", false)
                    .unwrap();
                element
            })
            .collect();
        drop(elements);
    }

    // 30_000 unique names went through the table
    assert!(Name::interned_count() < baseline + 4_000);
    assert!(Name::lookup("x-tag-0-0").is_none());
}

// ============================================================================
// SERIALIZATION BOUNDARIES
// ============================================================================

#[test]
fn test_every_buffer_size_yields_prefix() {
    let root = Element::create("div");
    root.set_attribute("title", "ünïcödé").unwrap();
    root.set_text_content("héllo wörld");
    let full = root.outer_html(&SerializerConfig::default()).unwrap();

    for capacity in 0..=full.len() + 1 {
        let mut buffer = vec![0xaau8; capacity];
        let result = root.serialize_into(&mut buffer);
        assert!(result.written < capacity.max(1));
        assert_eq!(result.truncated, capacity <= full.len());

        let text = std::str::from_utf8(&buffer[..result.written]).unwrap();
        assert!(full.starts_with(text), "capacity {capacity}: {text:?}");
        if capacity > 0 {
            assert_eq!(buffer[result.written], 0);
        }
    }
}

#[test]
fn test_values_are_not_escaped() {
    let element = Element::create("p");
    element.set_attribute("data-x", "a\"b").unwrap();
    element.set_text_content("<b>&</b>");
    assert_eq!(
        element.outer_html(&SerializerConfig::default()).unwrap(),
        "<p data-x=\"a\"b\"><b>&</b></p>"
    );
}

#[test]
fn test_deep_chain_serializes() {
    let (root, _bottom) = deep_chain(DEEP_CHAIN);
    let expected = format!(
        "{}{}",
        "<div>".repeat(DEEP_CHAIN + 1),
        "</div>".repeat(DEEP_CHAIN + 1)
    );

    let html = root.outer_html(&SerializerConfig::default()).unwrap();
    assert_eq!(html.len(), expected.len());
    assert!(html == expected);

    let mut buffer = vec![0u8; expected.len() + 1];
    let result = root.serialize_into(&mut buffer);
    assert_eq!(result.written, expected.len());
    assert!(!result.truncated);

    let mut small = vec![0u8; 4096];
    let result = root.serialize_into(&mut small);
    assert!(result.truncated);
    assert_eq!(&small[..result.written], &expected.as_bytes()[..4095]);
}

// ============================================================================
// HOST BRIDGE MISUSE
// ============================================================================

#[test]
fn test_bridge_handle_invalid_after_release() {
    let mut bridge = HostBridge::default();
    let handle = bridge.create("div");
    bridge.dec_ref(handle).unwrap();

    assert_eq!(
        bridge.set_attribute(handle, "id", "x"),
        Err(DomError::UnknownHandle(handle.0))
    );
    assert_eq!(bridge.inc_ref(handle), Err(DomError::UnknownHandle(handle.0)));
}

#[test]
fn test_bridge_append_with_unknown_child_changes_nothing() {
    let mut bridge = HostBridge::default();
    let parent = bridge.create("div");
    let child = bridge.create("p");

    let err = bridge
        .append(parent, &[child, ElementHandle(u32::MAX)])
        .unwrap_err();
    assert_eq!(err, DomError::UnknownHandle(u32::MAX));
    assert_eq!(bridge.get_first_child(parent).unwrap(), None);
}
