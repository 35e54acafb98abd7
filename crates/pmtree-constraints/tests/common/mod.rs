#![allow(dead_code)]

use pmtree_core::{NodeIndex, Operator, Tree, TreeBuilder};
use proptest::prelude::*;

/// Tree outline without labels; labels are assigned when building so every
/// task is unique.
#[derive(Debug, Clone)]
pub enum Sketch {
    Task,
    Op(Operator, Vec<Sketch>),
}

fn operator() -> impl Strategy<Value = Operator> {
    prop_oneof![
        Just(Operator::Seq),
        Just(Operator::Par),
        Just(Operator::Xor),
        Just(Operator::Loop),
    ]
}

/// Outlines that satisfy every arity rule.
pub fn valid_sketch() -> impl Strategy<Value = Sketch> {
    Just(Sketch::Task).prop_recursive(4, 40, 4, |inner| {
        (operator(), prop::collection::vec(inner, 2..5))
            .prop_map(|(op, children)| Sketch::Op(op, children))
    })
}

/// Outlines whose SEQ/PAR nodes may have zero or one child.
pub fn raw_sketch() -> impl Strategy<Value = Sketch> {
    Just(Sketch::Task).prop_recursive(4, 40, 4, |inner| {
        (operator(), prop::collection::vec(inner, 0..4))
            .prop_map(|(op, children)| Sketch::Op(op, children))
    })
}

fn place(builder: &mut TreeBuilder, sketch: &Sketch, next: &mut usize) {
    match sketch {
        Sketch::Task => {
            builder.task(format!("T{next}"));
            *next += 1;
        }
        Sketch::Op(op, children) => {
            builder.open(*op);
            for child in children {
                place(builder, child, next);
            }
            builder.close();
        }
    }
}

pub fn build(sketch: &Sketch) -> Tree {
    let mut builder = TreeBuilder::new();
    place(&mut builder, sketch, &mut 0);
    builder.build().expect("sketch builds a tree")
}

pub fn valid_tree() -> impl Strategy<Value = Tree> {
    valid_sketch().prop_map(|s| build(&s))
}

pub fn raw_tree() -> impl Strategy<Value = Tree> {
    raw_sketch().prop_map(|s| build(&s))
}

pub fn parse_all(srcs: &[&str]) -> Vec<Tree> {
    srcs.iter().map(|s| s.parse().expect("valid tree text")).collect()
}

/// Operator of the lowest common ancestor of two labelled tasks.
pub fn meeting_operator(tree: &Tree, a: &str, b: &str) -> Option<Operator> {
    let a = tree.find_by_label(a)?;
    let b = tree.find_by_label(b)?;
    let mut ancestors: Vec<NodeIndex> = Vec::new();
    let mut current = Some(a);
    while let Some(idx) = current {
        ancestors.push(idx);
        current = tree.parent(idx);
    }
    let mut current = Some(b);
    while let Some(idx) = current {
        if ancestors.contains(&idx) {
            return tree.operator(idx);
        }
        current = tree.parent(idx);
    }
    None
}
