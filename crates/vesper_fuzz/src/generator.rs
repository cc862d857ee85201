//! Random argument generation for fuzzer samples.
//!
//! Values are biased towards interesting bit patterns — zero, all-ones,
//! single set bits, alternating bits — with occasional mutations of earlier
//! arguments, which is where cross-argument bugs tend to hide. The caller
//! supplies the RNG so batches are reproducible from a seed.

use rand::rngs::StdRng;
use rand::Rng;
use vesper_ir::{BitsValue, IrError, IrResult, Type, TypeDb, TypeId, Value};

/// Generates one argument value per type, in order.
///
/// Later arguments may be derived from earlier ones by bit mutation.
pub fn generate_arguments(
    types: &[TypeId],
    db: &TypeDb,
    rng: &mut StdRng,
) -> IrResult<Vec<Value>> {
    let mut args: Vec<Value> = Vec::with_capacity(types.len());
    for &ty in types {
        let value = generate_argument(ty, db, rng, &args)?;
        args.push(value);
    }
    Ok(args)
}

fn generate_argument(
    ty: TypeId,
    db: &TypeDb,
    rng: &mut StdRng,
    prior: &[Value],
) -> IrResult<Value> {
    match db.get(ty) {
        Type::Bits { width } => Ok(Value::Bits(generate_bits(*width, rng, prior))),
        Type::Tuple { elements } => {
            let elements = elements.clone();
            let values = elements
                .iter()
                .map(|&e| generate_argument(e, db, rng, prior))
                .collect::<IrResult<Vec<_>>>()?;
            Ok(Value::Tuple(values))
        }
        Type::Struct { fields, .. } => {
            let fields = fields.clone();
            let values = fields
                .iter()
                .map(|&(_, fty)| generate_argument(fty, db, rng, prior))
                .collect::<IrResult<Vec<_>>>()?;
            Ok(Value::Tuple(values))
        }
        Type::Array { element, size } => {
            let (element, size) = (*element, *size);
            let values = (0..size)
                .map(|_| generate_argument(element, db, rng, prior))
                .collect::<IrResult<Vec<_>>>()?;
            Ok(Value::Array(values))
        }
        Type::Chan { .. } | Type::Function { .. } | Type::Meta { .. } => Err(
            IrError::InvariantViolation("cannot generate a value of this type".to_string()),
        ),
    }
}

fn generate_bits(width: u32, rng: &mut StdRng, prior: &[Value]) -> BitsValue {
    if width == 0 {
        return BitsValue::zero(0);
    }
    let prior_bits: Vec<&BitsValue> = prior
        .iter()
        .filter_map(|v| match v {
            Value::Bits(b) => Some(b),
            _ => None,
        })
        .collect();
    if !prior_bits.is_empty() && rng.gen_bool(0.5) {
        return mutate_prior(width, rng, &prior_bits);
    }
    unbiased_bits(width, rng)
}

/// Resizes a randomly chosen earlier argument and flips a zero-biased number
/// of its bits.
fn mutate_prior(width: u32, rng: &mut StdRng, prior: &[&BitsValue]) -> BitsValue {
    let source = prior[rng.gen_range(0..prior.len())];
    let mut value = source.resized(width);
    let mutation_count = rand_biased_towards_zero(width, rng);
    for _ in 0..mutation_count {
        value.flip_bit(rng.gen_range(0..width));
    }
    value
}

fn unbiased_bits(width: u32, rng: &mut StdRng) -> BitsValue {
    // Most of the time, use some interesting bit pattern.
    if rng.gen_bool(0.9) {
        let patterns = bit_patterns(width);
        return patterns[rng.gen_range(0..patterns.len())].clone();
    }
    let words = (0..(width as usize).div_ceil(64))
        .map(|_| rng.gen::<u64>())
        .collect();
    BitsValue::from_words(width, words)
}

/// Boundary patterns that historically shake out carry, sign, and width
/// handling bugs.
fn bit_patterns(width: u32) -> Vec<BitsValue> {
    let mut patterns = vec![
        BitsValue::zero(width),
        BitsValue::all_ones(width),
        BitsValue::from_u64(width, 1),
    ];
    // The high bit alone, where the sign of a signed interpretation lives.
    let mut high = BitsValue::zero(width);
    high.flip_bit(width - 1);
    patterns.push(high);
    // Alternating bit patterns.
    let word_count = (width as usize).div_ceil(64);
    patterns.push(BitsValue::from_words(
        width,
        vec![0x5555_5555_5555_5555; word_count],
    ));
    patterns.push(BitsValue::from_words(
        width,
        vec![0xaaaa_aaaa_aaaa_aaaa; word_count],
    ));
    patterns
}

/// A draw in `[0, limit)` biased towards zero: the minimum of two uniform
/// draws.
fn rand_biased_towards_zero(limit: u32, rng: &mut StdRng) -> u32 {
    rng.gen_range(0..limit).min(rng.gen_range(0..limit))
}
