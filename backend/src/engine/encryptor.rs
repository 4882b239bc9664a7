use std::sync::Arc;

use itertools::izip;
use sampling::distributions::Distribution;
use sampling::source::Source;

use crate::engine::arith::mul_mod;
use crate::engine::ciphertext::Ciphertext;
use crate::engine::context::{Context, ContextData};
use crate::engine::keys::{PublicKey, SecretKey};
use crate::engine::ntt::NttTable;
use crate::engine::parameters::SchemeType;
use crate::engine::plaintext::Plaintext;
use crate::engine::poly;
use crate::fault::{NativeFault, Result};

pub struct Encryptor {
    context: Arc<Context>,
    public_key: Option<PublicKey>,
    secret_key: Option<SecretKey>,
    source: Source,
}

impl Encryptor {
    pub fn new(context: Arc<Context>, public_key: Option<&PublicKey>, secret_key: Option<&SecretKey>) -> Result<Encryptor> {
        context.require_set()?;
        let mut encryptor: Encryptor = Encryptor {
            context,
            public_key: None,
            secret_key: None,
            source: Source::from_entropy(),
        };
        if let Some(public_key) = public_key {
            encryptor.set_public_key(public_key)?;
        }
        if let Some(secret_key) = secret_key {
            encryptor.set_secret_key(secret_key)?;
        }
        Ok(encryptor)
    }

    pub fn set_public_key(&mut self, public_key: &PublicKey) -> Result<()> {
        let mut public_key: PublicKey = public_key.clone();
        public_key.validate(&self.context)?;
        self.public_key = Some(public_key);
        Ok(())
    }

    pub fn set_secret_key(&mut self, secret_key: &SecretKey) -> Result<()> {
        secret_key.validate(&self.context)?;
        self.secret_key = Some(secret_key.clone());
        Ok(())
    }

    /// Level a plaintext encrypts at, and its message lifted into that
    /// level's residues (scaled by `Q/t` for BFV).
    fn encode_message(&self, plain: &Plaintext) -> Result<(Arc<ContextData>, Vec<u64>, f64)> {
        plain.validate(&self.context)?;
        match self.context.scheme() {
            SchemeType::Bfv => {
                if !plain.parms_id().is_zero() {
                    return Err(NativeFault::invalid_argument("BFV plaintext cannot carry a level"));
                }
                let level: Arc<ContextData> = self.context.first_context_data().clone();
                let n: usize = level.poly_modulus_degree();
                let message: Vec<u64> = izip!(level.moduli(), level.coeff_div_plain_modulus())
                    .flat_map(|(q, delta)| {
                        (0..n).map(move |j| mul_mod(plain.data().get(j).copied().unwrap_or(0), *delta, q))
                    })
                    .collect();
                Ok((level, message, 1.0))
            }
            SchemeType::Ckks => {
                let level: Arc<ContextData> = self.context.level(&plain.parms_id(), "plaintext parms_id")?.clone();
                Ok((level, plain.data().to_vec(), plain.scale()))
            }
            SchemeType::None => Err(NativeFault::logic_error("unsupported scheme")),
        }
    }

    /// `(pk0*u + e1 + m, pk1*u + e2)`.
    pub fn encrypt(&mut self, plain: &Plaintext) -> Result<Ciphertext> {
        let public_key: &PublicKey = self
            .public_key
            .as_ref()
            .ok_or_else(|| NativeFault::logic_error("public key is not set"))?;
        let (level, message, scale) = self.encode_message(plain)?;
        let n: usize = level.poly_modulus_degree();
        let k: usize = level.coeff_modulus_size();
        let moduli: Vec<u64> = level.moduli();
        let tables: &[NttTable] = level.ntt_tables();

        let mut u: Vec<u64> = poly::sample(Distribution::Ternary, &mut self.source, n, &moduli);
        poly::forward(&mut u, tables);

        let pk: &Ciphertext = public_key.ciphertext();
        let mut c0: Vec<u64> = poly::multiply_ntt(&pk.poly(0)[..n * k], &u, tables, &moduli);
        let mut c1: Vec<u64> = poly::multiply_ntt(&pk.poly(1)[..n * k], &u, tables, &moduli);
        let e1: Vec<u64> = poly::sample(Distribution::error(), &mut self.source, n, &moduli);
        let e2: Vec<u64> = poly::sample(Distribution::error(), &mut self.source, n, &moduli);
        poly::add_assign(&mut c0, &e1, n, &moduli);
        poly::add_assign(&mut c0, &message, n, &moduli);
        poly::add_assign(&mut c1, &e2, n, &moduli);

        log::trace!("encrypted at chain index {}", level.chain_index());
        Ok(Ciphertext::from_parts(
            &level,
            self.context.key_parms_id(),
            2,
            [c0, c1].concat(),
            scale,
        ))
    }

    /// `(-(a*s) + e + m, a)` for uniform `a`.
    pub fn encrypt_symmetric(&mut self, plain: &Plaintext) -> Result<Ciphertext> {
        let secret_key: &SecretKey = self
            .secret_key
            .as_ref()
            .ok_or_else(|| NativeFault::logic_error("secret key is not set"))?;
        let (level, message, scale) = self.encode_message(plain)?;
        let n: usize = level.poly_modulus_degree();
        let k: usize = level.coeff_modulus_size();
        let moduli: Vec<u64> = level.moduli();
        let tables: &[NttTable] = level.ntt_tables();

        let a_ntt: Vec<u64> = poly::uniform(&mut self.source, n, &moduli);
        let mut c1: Vec<u64> = a_ntt.clone();
        poly::backward(&mut c1, tables);
        let mut c0: Vec<u64> = a_ntt;
        poly::mul_assign(&mut c0, secret_key.ntt_prefix(n, k), n, &moduli);
        poly::backward(&mut c0, tables);
        poly::neg_assign(&mut c0, n, &moduli);
        let e: Vec<u64> = poly::sample(Distribution::error(), &mut self.source, n, &moduli);
        poly::add_assign(&mut c0, &e, n, &moduli);
        poly::add_assign(&mut c0, &message, n, &moduli);

        Ok(Ciphertext::from_parts(
            &level,
            self.context.key_parms_id(),
            2,
            [c0, c1].concat(),
            scale,
        ))
    }
}
