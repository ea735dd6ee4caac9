use proptest::prelude::*;

use civitas_motion::{MotionStore, MotionType, NewMotion, Ref, RefType};
use civitas_store::Tree;
use civitas_types::{MotionId, PolicyName, Timestamp};

const IDS: [&str; 4] = ["1", "2", "3", "4"];
const TYPES: [&str; 2] = ["addresses", "blocks"];

fn seeded_tree() -> Tree {
    let mut tree = Tree::new();
    for (i, id) in IDS.iter().enumerate() {
        let motion_type = if i % 2 == 0 { MotionType::Concern } else { MotionType::Proposal };
        MotionStore
            .open_motion(
                &mut tree,
                NewMotion {
                    id: MotionId::new(*id),
                    motion_type,
                    policy: PolicyName::new("pmp-concern-v1"),
                    author: None,
                    title: format!("motion {id}"),
                    body: String::new(),
                    tracker_url: String::new(),
                    labels: vec![],
                },
                Timestamp::new(0),
            )
            .unwrap();
    }
    tree
}

fn edge(from: usize, to: usize, t: usize) -> Ref {
    Ref::new(
        MotionId::new(IDS[from]),
        MotionId::new(IDS[to]),
        RefType::parse(TYPES[t]).unwrap(),
    )
}

fn ops() -> impl Strategy<Value = Vec<(bool, usize, usize, usize)>> {
    prop::collection::vec((any::<bool>(), 0usize..4, 0usize..4, 0usize..2), 0..40)
}

proptest! {
    /// Every ref_to edge has its mirror in the target's ref_by, and vice versa,
    /// after any sequence of additions and removals.
    #[test]
    fn mirror_invariant(ops in ops()) {
        let mut tree = seeded_tree();
        for (add, from, to, t) in ops {
            if from == to {
                continue;
            }
            let r = edge(from, to, t);
            if add {
                MotionStore.add_ref(&mut tree, &r).unwrap();
            } else {
                MotionStore.remove_ref(&mut tree, &r).unwrap();
            }
        }
        let motions = MotionStore.list(&tree).unwrap();
        for m in &motions {
            for r in m.ref_to.iter() {
                prop_assert_eq!(&r.from, &m.id);
                let target = motions.iter().find(|x| x.id == r.to).unwrap();
                prop_assert!(target.ref_by.contains(r));
            }
            for r in m.ref_by.iter() {
                prop_assert_eq!(&r.to, &m.id);
                let source = motions.iter().find(|x| x.id == r.from).unwrap();
                prop_assert!(source.ref_to.contains(r));
            }
        }
    }

    /// Adding the same edge twice leaves the same sizes as adding it once.
    #[test]
    fn add_ref_idempotent(from in 0usize..4, to in 0usize..4, t in 0usize..2) {
        prop_assume!(from != to);
        let r = edge(from, to, t);
        let mut once = seeded_tree();
        MotionStore.add_ref(&mut once, &r).unwrap();
        let mut twice = seeded_tree();
        MotionStore.add_ref(&mut twice, &r).unwrap();
        MotionStore.add_ref(&mut twice, &r).unwrap();
        prop_assert_eq!(once.files(), twice.files());
    }
}
