use std::sync::{Arc, OnceLock, Weak};

use fnv::FnvHashMap;
use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::engine::arith::gcd;
use crate::engine::modulus::{
    MAX_COEFF_MODULUS_COUNT, MAX_POLY_MODULUS_DEGREE, MAX_USER_MODULUS_BIT_COUNT, MIN_POLY_MODULUS_DEGREE,
    MIN_USER_MODULUS_BIT_COUNT, Modulus, SecurityLevel, max_bit_count,
};
use crate::engine::ntt::NttTable;
use crate::engine::parameters::{EncryptionParameters, ParmsId, SchemeType};
use crate::engine::rns::RnsBase;
use crate::fault::{NativeFault, Result};

/// Outcome of parameter validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorType {
    None = 1,
    Success = 0,
    InvalidScheme = -1,
    InvalidCoeffModulusSize = -2,
    InvalidCoeffModulusBitCount = -3,
    InvalidCoeffModulusNoNtt = -4,
    InvalidPolyModulusDegree = -5,
    InvalidPolyModulusDegreeNonPowerOfTwo = -6,
    InvalidParametersInsecure = -8,
    FailedCreatingRnsBase = -9,
    InvalidPlainModulusBitCount = -10,
    InvalidPlainModulusCoprimality = -11,
    InvalidPlainModulusTooLarge = -12,
    InvalidPlainModulusNonzero = -13,
}

impl ErrorType {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorType::None => "none",
            ErrorType::Success => "success",
            ErrorType::InvalidScheme => "invalid_scheme",
            ErrorType::InvalidCoeffModulusSize => "invalid_coeff_modulus_size",
            ErrorType::InvalidCoeffModulusBitCount => "invalid_coeff_modulus_bit_count",
            ErrorType::InvalidCoeffModulusNoNtt => "invalid_coeff_modulus_no_ntt",
            ErrorType::InvalidPolyModulusDegree => "invalid_poly_modulus_degree",
            ErrorType::InvalidPolyModulusDegreeNonPowerOfTwo => "invalid_poly_modulus_degree_non_power_of_two",
            ErrorType::InvalidParametersInsecure => "invalid_parameters_insecure",
            ErrorType::FailedCreatingRnsBase => "failed_creating_rns_base",
            ErrorType::InvalidPlainModulusBitCount => "invalid_plain_modulus_bit_count",
            ErrorType::InvalidPlainModulusCoprimality => "invalid_plain_modulus_coprimality",
            ErrorType::InvalidPlainModulusTooLarge => "invalid_plain_modulus_too_large",
            ErrorType::InvalidPlainModulusNonzero => "invalid_plain_modulus_nonzero",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorType::None => "constructed but not yet validated",
            ErrorType::Success => "valid",
            ErrorType::InvalidScheme => "scheme must be BFV or CKKS",
            ErrorType::InvalidCoeffModulusSize => {
                "coeff_modulus's primes' count is not bounded by [1, 64]"
            }
            ErrorType::InvalidCoeffModulusBitCount => {
                "coeff_modulus's primes' bit counts are not bounded by [2, 60]"
            }
            ErrorType::InvalidCoeffModulusNoNtt => "coeff_modulus's primes are not congruent to 1 modulo (2 * poly_modulus_degree)",
            ErrorType::InvalidPolyModulusDegree => {
                "poly_modulus_degree is not bounded by [2, 32768]"
            }
            ErrorType::InvalidPolyModulusDegreeNonPowerOfTwo => "poly_modulus_degree is not a power of two",
            ErrorType::InvalidParametersInsecure => "parameters are not compliant with HomomorphicEncryption.org security standard",
            ErrorType::FailedCreatingRnsBase => "coeff_modulus's primes are not pairwise coprime",
            ErrorType::InvalidPlainModulusBitCount => {
                "plain_modulus's bit count is not bounded by [2, 60]"
            }
            ErrorType::InvalidPlainModulusCoprimality => "plain_modulus is not coprime to coeff_modulus",
            ErrorType::InvalidPlainModulusTooLarge => "plain_modulus is not smaller than coeff_modulus",
            ErrorType::InvalidPlainModulusNonzero => "plain_modulus is not zero",
        }
    }

    pub fn from_i32(value: i32) -> Option<ErrorType> {
        ErrorType::ALL.into_iter().find(|e| *e as i32 == value)
    }

    pub const ALL: [ErrorType; 14] = [
        ErrorType::None,
        ErrorType::Success,
        ErrorType::InvalidScheme,
        ErrorType::InvalidCoeffModulusSize,
        ErrorType::InvalidCoeffModulusBitCount,
        ErrorType::InvalidCoeffModulusNoNtt,
        ErrorType::InvalidPolyModulusDegree,
        ErrorType::InvalidPolyModulusDegreeNonPowerOfTwo,
        ErrorType::InvalidParametersInsecure,
        ErrorType::FailedCreatingRnsBase,
        ErrorType::InvalidPlainModulusBitCount,
        ErrorType::InvalidPlainModulusCoprimality,
        ErrorType::InvalidPlainModulusTooLarge,
        ErrorType::InvalidPlainModulusNonzero,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct EncryptionParameterQualifiers {
    pub parameter_error: ErrorType,
    pub using_fft: bool,
    pub using_ntt: bool,
    pub using_batching: bool,
    pub using_fast_plain_lift: bool,
    pub using_descending_modulus_chain: bool,
    pub sec_level: SecurityLevel,
}

impl EncryptionParameterQualifiers {
    fn new(sec_level: SecurityLevel) -> Self {
        Self {
            parameter_error: ErrorType::None,
            using_fft: false,
            using_ntt: false,
            using_batching: false,
            using_fast_plain_lift: false,
            using_descending_modulus_chain: false,
            sec_level,
        }
    }

    pub fn parameters_set(&self) -> bool {
        self.parameter_error == ErrorType::Success
    }
}

/// Precomputation for one level of the modulus chain.
#[derive(Debug)]
pub struct ContextData {
    parms: EncryptionParameters,
    qualifiers: EncryptionParameterQualifiers,
    chain_index: usize,
    total_coeff_modulus_bit_count: u32,
    base: Option<RnsBase>,
    ntt_tables: Vec<NttTable>,
    coeff_div_plain_modulus: Vec<u64>,
    plain_upper_half_threshold: u64,
    plain_upper_half_increment: Vec<u64>,
    plain_ntt: Option<NttTable>,
    prev: OnceLock<Weak<ContextData>>,
    next: Option<Arc<ContextData>>,
}

impl ContextData {
    fn build(parms: EncryptionParameters, sec_level: SecurityLevel) -> ContextData {
        let mut data: ContextData = ContextData {
            parms,
            qualifiers: EncryptionParameterQualifiers::new(sec_level),
            chain_index: 0,
            total_coeff_modulus_bit_count: 0,
            base: None,
            ntt_tables: Vec::new(),
            coeff_div_plain_modulus: Vec::new(),
            plain_upper_half_threshold: 0,
            plain_upper_half_increment: Vec::new(),
            plain_ntt: None,
            prev: OnceLock::new(),
            next: None,
        };
        data.qualifiers.parameter_error = data.validate();
        data
    }

    fn validate(&mut self) -> ErrorType {
        let parms: &EncryptionParameters = &self.parms;
        if parms.scheme() == SchemeType::None {
            return ErrorType::InvalidScheme;
        }

        let coeff_modulus: Vec<u64> = parms.coeff_modulus().iter().map(|q| q.value()).collect();
        if coeff_modulus.is_empty() || coeff_modulus.len() > MAX_COEFF_MODULUS_COUNT {
            return ErrorType::InvalidCoeffModulusSize;
        }
        if parms
            .coeff_modulus()
            .iter()
            .any(|q| !(MIN_USER_MODULUS_BIT_COUNT..=MAX_USER_MODULUS_BIT_COUNT).contains(&q.bit_count()))
        {
            return ErrorType::InvalidCoeffModulusBitCount;
        }
        let Some(base) = RnsBase::new(&coeff_modulus) else {
            return ErrorType::FailedCreatingRnsBase;
        };
        self.total_coeff_modulus_bit_count = base.product().bits() as u32;

        let n: u64 = parms.poly_modulus_degree();
        if !(MIN_POLY_MODULUS_DEGREE..=MAX_POLY_MODULUS_DEGREE).contains(&n) {
            return ErrorType::InvalidPolyModulusDegree;
        }
        if !n.is_power_of_two() {
            return ErrorType::InvalidPolyModulusDegreeNonPowerOfTwo;
        }
        self.qualifiers.using_fft = true;

        let sec_level: SecurityLevel = self.qualifiers.sec_level;
        if sec_level != SecurityLevel::None && self.total_coeff_modulus_bit_count > max_bit_count(n, sec_level) {
            return ErrorType::InvalidParametersInsecure;
        }

        if parms.coeff_modulus().iter().any(|q| !q.is_prime()) {
            return ErrorType::InvalidCoeffModulusNoNtt;
        }
        let Some(ntt_tables) = coeff_modulus
            .iter()
            .map(|q| NttTable::new(*q, n as usize))
            .collect::<Option<Vec<NttTable>>>()
        else {
            return ErrorType::InvalidCoeffModulusNoNtt;
        };
        self.qualifiers.using_ntt = true;
        self.qualifiers.using_descending_modulus_chain = coeff_modulus.windows(2).all(|w| w[0] > w[1]);

        match parms.scheme() {
            SchemeType::Bfv => {
                let t: Modulus = *parms.plain_modulus();
                if !(MIN_USER_MODULUS_BIT_COUNT..=MAX_USER_MODULUS_BIT_COUNT).contains(&t.bit_count()) {
                    return ErrorType::InvalidPlainModulusBitCount;
                }
                if coeff_modulus.iter().any(|q| gcd(*q, t.value()) != 1) {
                    return ErrorType::InvalidPlainModulusCoprimality;
                }
                if BigUint::from(t.value()) >= *base.product() {
                    return ErrorType::InvalidPlainModulusTooLarge;
                }
                let delta: BigUint = base.product() / BigUint::from(t.value());
                self.coeff_div_plain_modulus = coeff_modulus
                    .iter()
                    .map(|q| (&delta % BigUint::from(*q)).to_u64().unwrap_or(0))
                    .collect();
                self.plain_upper_half_threshold = (t.value() + 1) >> 1;
                self.plain_upper_half_increment = coeff_modulus
                    .iter()
                    .map(|q| (q - t.value() % q) % q)
                    .collect();
                self.qualifiers.using_fast_plain_lift = coeff_modulus.iter().all(|q| *q > t.value());
                if t.is_prime() {
                    self.plain_ntt = NttTable::new(t.value(), n as usize);
                }
                self.qualifiers.using_batching = self.plain_ntt.is_some();
            }
            SchemeType::Ckks => {
                if !parms.plain_modulus().is_zero() {
                    return ErrorType::InvalidPlainModulusNonzero;
                }
            }
            SchemeType::None => return ErrorType::InvalidScheme,
        }

        self.base = Some(base);
        self.ntt_tables = ntt_tables;
        ErrorType::Success
    }

    pub fn parms(&self) -> &EncryptionParameters {
        &self.parms
    }

    pub fn parms_id(&self) -> ParmsId {
        self.parms.parms_id()
    }

    pub fn qualifiers(&self) -> &EncryptionParameterQualifiers {
        &self.qualifiers
    }

    /// Position in the modulus chain; the last level has index zero.
    pub fn chain_index(&self) -> usize {
        self.chain_index
    }

    pub fn total_coeff_modulus_bit_count(&self) -> u32 {
        self.total_coeff_modulus_bit_count
    }

    pub fn poly_modulus_degree(&self) -> usize {
        self.parms.poly_modulus_degree() as usize
    }

    pub fn coeff_modulus_size(&self) -> usize {
        self.parms.coeff_modulus().len()
    }

    pub fn moduli(&self) -> Vec<u64> {
        self.parms.coeff_modulus().iter().map(|q| q.value()).collect()
    }

    pub fn plain_modulus(&self) -> u64 {
        self.parms.plain_modulus().value()
    }

    pub fn base(&self) -> Result<&RnsBase> {
        self.base
            .as_ref()
            .ok_or_else(|| NativeFault::logic_error("encryption parameters are not set correctly"))
    }

    pub fn ntt_tables(&self) -> &[NttTable] {
        &self.ntt_tables
    }

    pub fn coeff_div_plain_modulus(&self) -> &[u64] {
        &self.coeff_div_plain_modulus
    }

    pub fn plain_upper_half_threshold(&self) -> u64 {
        self.plain_upper_half_threshold
    }

    pub fn plain_upper_half_increment(&self) -> &[u64] {
        &self.plain_upper_half_increment
    }

    pub fn plain_ntt(&self) -> Option<&NttTable> {
        self.plain_ntt.as_ref()
    }

    pub fn prev_context_data(&self) -> Option<Arc<ContextData>> {
        self.prev.get().and_then(Weak::upgrade)
    }

    pub fn next_context_data(&self) -> Option<Arc<ContextData>> {
        self.next.clone()
    }
}

/// Validated parameters together with the chain of levels obtained by
/// dropping coefficient moduli from the end.
#[derive(Debug)]
pub struct Context {
    key: Arc<ContextData>,
    first: Arc<ContextData>,
    last: Arc<ContextData>,
    levels: FnvHashMap<ParmsId, Arc<ContextData>>,
    using_keyswitching: bool,
}

impl Context {
    pub fn new(parms: &EncryptionParameters, expand_mod_chain: bool, sec_level: SecurityLevel) -> Context {
        let key: ContextData = ContextData::build(parms.clone(), sec_level);
        let mut chain: Vec<ContextData> = Vec::new();

        if key.qualifiers.parameters_set() && key.coeff_modulus_size() > 1 {
            let first: ContextData = ContextData::build(parms.drop_last_modulus(), sec_level);
            if first.qualifiers.parameters_set() {
                let mut remaining: usize = if expand_mod_chain { first.coeff_modulus_size() - 1 } else { 0 };
                chain.push(key);
                chain.push(first);
                while remaining > 0 {
                    let Some(prev) = chain.last() else { break };
                    let next: ContextData = ContextData::build(prev.parms.drop_last_modulus(), sec_level);
                    if !next.qualifiers.parameters_set() {
                        break;
                    }
                    chain.push(next);
                    remaining -= 1;
                }
            } else {
                chain.push(key);
            }
        } else {
            chain.push(key);
        }

        let mut levels: FnvHashMap<ParmsId, Arc<ContextData>> = FnvHashMap::default();
        let mut linked: Vec<Arc<ContextData>> = Vec::with_capacity(chain.len());
        let mut next: Option<Arc<ContextData>> = None;
        for (chain_index, mut data) in chain.into_iter().rev().enumerate() {
            data.chain_index = chain_index;
            data.next = next.take();
            let data: Arc<ContextData> = Arc::new(data);
            if let Some(child) = data.next.as_ref() {
                let _ = child.prev.set(Arc::downgrade(&data));
            }
            levels.insert(data.parms_id(), data.clone());
            next = Some(data.clone());
            linked.push(data);
        }
        linked.reverse();

        let key: Arc<ContextData> = linked[0].clone();
        let first: Arc<ContextData> = linked.get(1).unwrap_or(&linked[0]).clone();
        let last: Arc<ContextData> = linked[linked.len() - 1].clone();
        let using_keyswitching: bool = linked.len() > 1;

        log::debug!(
            "context: {} level(s), parameter_error={}, keyswitching={}",
            linked.len(),
            first.qualifiers.parameter_error.name(),
            using_keyswitching
        );

        Context {
            key,
            first,
            last,
            levels,
            using_keyswitching,
        }
    }

    pub fn parameters_set(&self) -> bool {
        self.first.qualifiers.parameters_set()
    }

    pub fn parameter_error(&self) -> ErrorType {
        self.first.qualifiers.parameter_error
    }

    pub fn using_keyswitching(&self) -> bool {
        self.using_keyswitching
    }

    pub fn key_context_data(&self) -> &Arc<ContextData> {
        &self.key
    }

    pub fn first_context_data(&self) -> &Arc<ContextData> {
        &self.first
    }

    pub fn last_context_data(&self) -> &Arc<ContextData> {
        &self.last
    }

    pub fn key_parms_id(&self) -> ParmsId {
        self.key.parms_id()
    }

    pub fn first_parms_id(&self) -> ParmsId {
        self.first.parms_id()
    }

    pub fn last_parms_id(&self) -> ParmsId {
        self.last.parms_id()
    }

    pub fn get_context_data(&self, parms_id: &ParmsId) -> Option<&Arc<ContextData>> {
        self.levels.get(parms_id)
    }

    /// Level for `parms_id`, or an invalid-argument fault naming `what`.
    pub(crate) fn level(&self, parms_id: &ParmsId, what: &str) -> Result<&Arc<ContextData>> {
        self.levels
            .get(parms_id)
            .ok_or_else(|| NativeFault::invalid_argument(format!("{what} is not valid for encryption parameters")))
    }

    pub(crate) fn require_set(&self) -> Result<()> {
        if self.parameters_set() {
            Ok(())
        } else {
            Err(NativeFault::invalid_argument(format!(
                "encryption parameters are not set correctly: {}",
                self.parameter_error().message()
            )))
        }
    }

    pub(crate) fn scheme(&self) -> SchemeType {
        self.key.parms.scheme()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::modulus::{CoeffModulus, PlainModulus};

    pub(crate) fn bfv_context(n: u64, bit_sizes: &[i32], plain_bits: i32) -> Arc<Context> {
        let mut parms: EncryptionParameters = EncryptionParameters::new(SchemeType::Bfv);
        parms.set_poly_modulus_degree(n).unwrap();
        parms
            .set_coeff_modulus(&CoeffModulus::create(n, bit_sizes).unwrap())
            .unwrap();
        parms
            .set_plain_modulus(PlainModulus::batching(n, plain_bits).unwrap())
            .unwrap();
        Arc::new(Context::new(&parms, true, SecurityLevel::None))
    }

    pub(crate) fn ckks_context(n: u64, bit_sizes: &[i32]) -> Arc<Context> {
        let mut parms: EncryptionParameters = EncryptionParameters::new(SchemeType::Ckks);
        parms.set_poly_modulus_degree(n).unwrap();
        parms
            .set_coeff_modulus(&CoeffModulus::create(n, bit_sizes).unwrap())
            .unwrap();
        Arc::new(Context::new(&parms, true, SecurityLevel::None))
    }

    #[test]
    fn chain_drops_special_prime_then_expands() {
        let context: Arc<Context> = bfv_context(64, &[40, 40, 40, 41], 17);
        assert!(context.parameters_set());
        assert!(context.using_keyswitching());
        assert_eq!(context.key_context_data().coeff_modulus_size(), 4);
        assert_eq!(context.first_context_data().coeff_modulus_size(), 3);
        assert_eq!(context.last_context_data().coeff_modulus_size(), 1);
        assert_eq!(context.key_context_data().chain_index(), 3);
        assert_eq!(context.last_context_data().chain_index(), 0);

        let first: Arc<ContextData> = context.first_context_data().clone();
        let prev: Arc<ContextData> = first.prev_context_data().unwrap();
        assert_eq!(prev.parms_id(), context.key_parms_id());
        let next: Arc<ContextData> = first.next_context_data().unwrap();
        assert_eq!(next.chain_index(), 1);
        assert!(context.last_context_data().next_context_data().is_none());
        assert!(context.key_context_data().prev_context_data().is_none());
    }

    #[test]
    fn single_modulus_has_no_keyswitching() {
        let context: Arc<Context> = bfv_context(64, &[50], 17);
        assert!(context.parameters_set());
        assert!(!context.using_keyswitching());
        assert_eq!(context.key_parms_id(), context.first_parms_id());
        assert_eq!(context.first_parms_id(), context.last_parms_id());
    }

    #[test]
    fn unexpanded_chain_stops_at_first() {
        let mut parms: EncryptionParameters = EncryptionParameters::new(SchemeType::Ckks);
        parms.set_poly_modulus_degree(64).unwrap();
        parms
            .set_coeff_modulus(&CoeffModulus::create(64, &[40, 40, 40]).unwrap())
            .unwrap();
        let context: Context = Context::new(&parms, false, SecurityLevel::None);
        assert_eq!(context.first_parms_id(), context.last_parms_id());
        assert_ne!(context.key_parms_id(), context.first_parms_id());
    }

    #[test]
    fn invalid_parameters_are_reported() {
        let mut parms: EncryptionParameters = EncryptionParameters::new(SchemeType::Bfv);
        parms.set_poly_modulus_degree(4096).unwrap();
        parms
            .set_coeff_modulus(&CoeffModulus::create(4096, &[60, 60, 60]).unwrap())
            .unwrap();
        parms.set_plain_modulus(Modulus::new(65537).unwrap()).unwrap();
        let context: Context = Context::new(&parms, true, SecurityLevel::Tc128);
        assert!(!context.parameters_set());
        assert_eq!(context.parameter_error(), ErrorType::InvalidParametersInsecure);
        assert!(context.require_set().is_err());

        let mut parms: EncryptionParameters = EncryptionParameters::new(SchemeType::Bfv);
        parms.set_poly_modulus_degree(64).unwrap();
        parms.set_coeff_modulus(&[Modulus::new(65537).unwrap()]).unwrap();
        parms.set_plain_modulus(Modulus::new(65537).unwrap()).unwrap();
        let context: Context = Context::new(&parms, true, SecurityLevel::None);
        assert_eq!(context.parameter_error(), ErrorType::InvalidPlainModulusCoprimality);
    }

    #[test]
    fn batching_qualifier_requires_ntt_friendly_plain_modulus() {
        let context: Arc<Context> = bfv_context(64, &[40, 40], 17);
        assert!(context.first_context_data().qualifiers().using_batching);

        let mut parms: EncryptionParameters = EncryptionParameters::new(SchemeType::Bfv);
        parms.set_poly_modulus_degree(64).unwrap();
        parms
            .set_coeff_modulus(&CoeffModulus::create(64, &[40, 40]).unwrap())
            .unwrap();
        parms.set_plain_modulus(Modulus::new(1 << 10).unwrap()).unwrap();
        let context: Context = Context::new(&parms, true, SecurityLevel::None);
        assert!(context.parameters_set());
        assert!(!context.first_context_data().qualifiers().using_batching);
    }
}
