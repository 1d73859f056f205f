//! Utilities for serializing and deserializing ECDAA types using Serde.
//!
//! Curve-generic types cannot derive `Serialize` and `Deserialize`, and the byte layout of every
//! wire type is fixed anyway, so Serde support goes through [`Encode`]/[`Decode`]: a value
//! serializes as a single byte string holding its fixed-width encoding.
//!
//! [`impl_serde_via_encoding!`](crate::impl_serde_via_encoding) implements both traits for one or
//! more types generic over `C: PairingCurve`.

use crate::encoding::{Decode, Encode};
use serde::de::{self, SeqAccess, Visitor};
use std::{fmt, marker::PhantomData};

#[doc(hidden)]
pub use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serialize a value as the byte string of its fixed-width encoding.
pub fn serialize_encoded<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Encode,
    S: Serializer,
{
    serializer.serialize_bytes(&value.to_bytes())
}

/// Deserialize a value from the byte string of its fixed-width encoding.
///
/// Accepts either a byte string or a sequence of bytes, so that self-describing formats which
/// render bytes as arrays round-trip.
pub fn deserialize_encoded<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Decode,
    D: Deserializer<'de>,
{
    struct EncodingVisitor<T> {
        _phantom: PhantomData<T>,
    }

    impl<'de, T: Decode> Visitor<'de> for EncodingVisitor<T> {
        type Value = T;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a fixed-width ECDAA encoding")
        }

        fn visit_bytes<E>(self, bytes: &[u8]) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            T::from_bytes(bytes).map_err(de::Error::custom)
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(byte) = seq.next_element::<u8>()? {
                bytes.push(byte);
            }
            T::from_bytes(&bytes).map_err(de::Error::custom)
        }
    }

    deserializer.deserialize_bytes(EncodingVisitor {
        _phantom: PhantomData,
    })
}

/// Implement `serde::Serialize` and `serde::Deserialize` for types of the form `Name<C>` with
/// `C: PairingCurve`, through their [`Encode`] and [`Decode`] implementations.
#[macro_export]
macro_rules! impl_serde_via_encoding {
    ($($name:ident),+ $(,)?) => {
        $(
            impl<C: $crate::curve::PairingCurve> $crate::serde::Serialize for $name<C> {
                fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
                where
                    S: $crate::serde::Serializer,
                {
                    $crate::serde::serialize_encoded(self, serializer)
                }
            }

            impl<'de, C: $crate::curve::PairingCurve> $crate::serde::Deserialize<'de> for $name<C> {
                fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
                where
                    D: $crate::serde::Deserializer<'de>,
                {
                    $crate::serde::deserialize_encoded(deserializer)
                }
            }
        )+
    };
}

#[cfg(test)]
mod test {
    use crate::{
        curve::{Bls12381, PairingCurve},
        encoding::{Decode, Encode, Reader, Writer},
        test::rng,
        Error,
    };

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Pair<C: PairingCurve> {
        point: C::G1,
        scalar: C::Scalar,
    }

    impl<C: PairingCurve> Encode for Pair<C> {
        fn encode(&self, writer: &mut Writer) {
            writer.point(&self.point);
            writer.scalar::<C>(&self.scalar);
        }
    }

    impl<C: PairingCurve> Decode for Pair<C> {
        fn decode(reader: &mut Reader<'_>) -> Result<Self, Error> {
            Ok(Self {
                point: reader.point("point")?,
                scalar: reader.scalar::<C>("scalar")?,
            })
        }
    }

    crate::impl_serde_via_encoding!(Pair);

    #[test]
    fn bincode_round_trip_uses_the_fixed_width_encoding() {
        let mut rng = rng();
        let pair = Pair::<Bls12381> {
            point: Bls12381::hash_to_g1(b"point"),
            scalar: Bls12381::random_scalar(&mut rng).unwrap(),
        };

        let bytes = bincode::serialize(&pair).unwrap();
        // bincode prefixes byte strings with a u64 length.
        assert_eq!(&bytes[8..], pair.to_bytes().as_slice());

        let decoded: Pair<Bls12381> = bincode::deserialize(&bytes).unwrap();
        assert_eq!(pair, decoded);
    }

    #[test]
    fn bad_encodings_fail_to_deserialize() {
        let bytes = bincode::serialize(&vec![0u8; 80]).unwrap();
        assert!(bincode::deserialize::<Pair<Bls12381>>(&bytes).is_err());
    }
}
