use proptest::prelude::*;

use civitas_types::{Ns, Timestamp, User};

proptest! {
    /// Any namespace built from valid segments survives a path round trip.
    #[test]
    fn ns_path_roundtrip(segs in prop::collection::vec("[a-z0-9_-]{1,12}", 0..6)) {
        let ns = Ns::from_segments(segs.clone()).unwrap();
        let back = Ns::parse(&ns.path()).unwrap();
        prop_assert_eq!(back.segments(), &segs[..]);
    }

    /// Handles containing a slash never validate.
    #[test]
    fn user_with_slash_is_invalid(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
        let user = User::new(format!("{a}/{b}"));
        prop_assert!(!user.is_valid());
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        prop_assert_eq!(Timestamp::new(a) <= Timestamp::new(b), a <= b);
    }
}
