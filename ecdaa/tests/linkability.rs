mod test_utils;

use group::GroupEncoding;
use test_utils::{issuer, join, member_rng, signing_rng, verify};

#[test]
fn signatures_without_basename_share_nothing() {
    let mut issuer = issuer();
    let member = join(&mut issuer, &mut member_rng());
    let mut rng = signing_rng();
    let first = member.sign(b"message", None, &mut rng).unwrap();
    let second = member.sign(b"message", None, &mut rng).unwrap();

    let gpk = issuer.keypair().group_public_key();
    verify(&first, gpk, b"message", None).unwrap();
    verify(&second, gpk, b"message", None).unwrap();

    for a in first.randomized_credential().iter() {
        for b in second.randomized_credential().iter() {
            assert_ne!(a.to_bytes().as_ref(), b.to_bytes().as_ref());
        }
    }
    assert_ne!(first.proof().nonce(), second.proof().nonce());
    assert_eq!(first.pseudonym(), None);
}

#[test]
fn same_basename_links_signatures() {
    let mut issuer = issuer();
    let member = join(&mut issuer, &mut member_rng());
    let mut rng = signing_rng();
    let basename = &b"relying-party"[..];
    let first = member.sign(b"first", Some(basename), &mut rng).unwrap();
    let second = member.sign(b"second", Some(basename), &mut rng).unwrap();

    let gpk = issuer.keypair().group_public_key();
    verify(&first, gpk, b"first", Some(basename)).unwrap();
    verify(&second, gpk, b"second", Some(basename)).unwrap();
    assert!(first.pseudonym().is_some());
    assert_eq!(first.pseudonym(), second.pseudonym());
    assert_ne!(first.randomized_credential(), second.randomized_credential());
}

#[test]
fn different_basenames_or_members_do_not_link() {
    let mut issuer = issuer();
    let mut rng = member_rng();
    let alice = join(&mut issuer, &mut rng);
    let bob = join(&mut issuer, &mut rng);
    let mut rng = signing_rng();

    let a1 = alice.sign(b"m", Some(&b"one"[..]), &mut rng).unwrap();
    let a2 = alice.sign(b"m", Some(&b"two"[..]), &mut rng).unwrap();
    let b1 = bob.sign(b"m", Some(&b"one"[..]), &mut rng).unwrap();

    assert_ne!(a1.pseudonym(), a2.pseudonym());
    assert_ne!(a1.pseudonym(), b1.pseudonym());
}
