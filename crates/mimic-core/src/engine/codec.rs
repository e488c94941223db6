// Mimic Engine — Model Codec
//
// Converts a chain to/from the byte payload kept in the brain store.
// Payload: JSON envelope `{ "version": 1, "chain": { … } }`.
//
// Decoding is permissive: absent, empty, corrupt or future-version payloads
// all decode to an empty chain so training can restart from scratch.
// A bare chain object (no envelope) and the literal `{}` are also accepted.

use crate::atoms::constants::CODEC_VERSION;
use crate::atoms::error::EngineResult;
use crate::engine::markov::{ChainOptions, MarkovChain};
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    chain: &'a MarkovChain,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    chain: MarkovChain,
}

pub fn encode(chain: &MarkovChain) -> EngineResult<Vec<u8>> {
    Ok(serde_json::to_vec(&EnvelopeRef { version: CODEC_VERSION, chain })?)
}

/// Decode a stored payload. Never fails; see module docs.
pub fn decode(bytes: Option<&[u8]>, options: ChainOptions) -> MarkovChain {
    let Some(bytes) = bytes.filter(|b| !b.is_empty()) else {
        return MarkovChain::new(options);
    };

    if let Ok(envelope) = serde_json::from_slice::<Envelope>(bytes) {
        if envelope.version <= CODEC_VERSION {
            return envelope.chain.with_options(options);
        }
        warn!("[codec] Unsupported payload version {}, starting fresh", envelope.version);
        return MarkovChain::new(options);
    }

    match serde_json::from_slice::<MarkovChain>(bytes) {
        Ok(chain) => chain.with_options(options),
        Err(e) => {
            warn!("[codec] Discarding corrupt model payload ({} bytes): {}", bytes.len(), e);
            MarkovChain::new(options)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn trained() -> MarkovChain {
        let mut c = MarkovChain::new(ChainOptions::default());
        c.train("we all live in a yellow submarine");
        c.train("yellow is a happy colour");
        c.train("a submarine lives under the sea");
        c
    }

    #[test]
    fn test_round_trip_responds_identically() {
        let original = trained();
        let bytes = encode(&original).unwrap();
        let restored = decode(Some(&bytes), ChainOptions::default());

        assert_eq!(restored, original);
        for seed in 0..10u64 {
            assert_eq!(
                original.respond("yellow submarine", &mut StdRng::seed_from_u64(seed)),
                restored.respond("yellow submarine", &mut StdRng::seed_from_u64(seed)),
            );
        }
    }

    #[test]
    fn test_absent_and_empty_decode_to_empty_chain() {
        assert!(decode(None, ChainOptions::default()).is_empty());
        assert!(decode(Some(b""), ChainOptions::default()).is_empty());
        assert!(decode(Some(b"{}"), ChainOptions::default()).is_empty());
    }

    #[test]
    fn test_corrupt_payload_decodes_to_empty_chain() {
        assert!(decode(Some(b"\x00\xffnot json"), ChainOptions::default()).is_empty());
        assert!(decode(Some(br#"{"version":1,"chain":42}"#), ChainOptions::default()).is_empty());
    }

    #[test]
    fn test_future_version_is_discarded() {
        let payload = br#"{"version":99,"chain":{"ends":{"x":1}}}"#;
        assert!(decode(Some(payload), ChainOptions::default()).is_empty());
    }

    #[test]
    fn test_decode_applies_current_options() {
        let bytes = encode(&trained()).unwrap();
        let opts = ChainOptions { min_words: 4, ..Default::default() };
        let mut restored = decode(Some(&bytes), opts);
        assert_eq!(restored.options(), opts);
        assert!(!restored.train("only three words"));
    }
}
