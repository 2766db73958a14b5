//! Room code generation.

use rand::Rng;

use gambit_protocol::{RoomId, ROOM_CODE_LEN};

/// Uppercase alphanumerics minus the easily-confused 0/O and 1/I.
/// Codes are read aloud or typed from another screen.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a fresh room code. Uniqueness against active rooms is the
/// registry's job; this only produces a well-formed candidate.
pub fn generate<R: Rng>(rng: &mut R) -> RoomId {
    let code: String = (0..ROOM_CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    RoomId::parse(&code).expect("generated codes are always well-formed")
}
