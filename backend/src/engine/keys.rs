use std::io::{Read, Result as IoResult, Write};
use std::sync::Arc;

use byteorder::{LittleEndian, WriteBytesExt};
use sampling::distributions::Distribution;
use sampling::source::Source;

use crate::engine::ciphertext::Ciphertext;
use crate::engine::context::{Context, ContextData};
use crate::engine::parameters::ParmsId;
use crate::engine::poly;
use crate::engine::serialization::{ReaderFrom, WriterTo, read_count, read_u64_vec, write_u64_slice};
use crate::fault::{NativeFault, Result};

/// Ternary secret, kept in the NTT domain at the key level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecretKey {
    data: Vec<u64>,
    parms_id: ParmsId,
}

impl SecretKey {
    pub fn parms_id(&self) -> ParmsId {
        self.parms_id
    }

    /// NTT residues for the first `k` moduli of the key level.
    pub(crate) fn ntt_prefix(&self, n: usize, k: usize) -> &[u64] {
        &self.data[..n * k]
    }

    pub fn validate(&self, context: &Context) -> Result<()> {
        context.require_set()?;
        if self.parms_id != context.key_parms_id() {
            return Err(NativeFault::invalid_argument("secret key is not valid for encryption parameters"));
        }
        let key: &Arc<ContextData> = context.key_context_data();
        let n: usize = key.poly_modulus_degree();
        if self.data.len() != n * key.coeff_modulus_size() {
            return Err(NativeFault::invalid_argument("secret key data length does not match the key level"));
        }
        let reduced: bool = self
            .data
            .chunks_exact(n)
            .zip(key.moduli())
            .all(|(residues, q)| residues.iter().all(|c| *c < q));
        if !reduced {
            return Err(NativeFault::invalid_argument("secret key residue is not reduced"));
        }
        Ok(())
    }
}

impl WriterTo for SecretKey {
    fn write_to<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        self.parms_id.write_to(writer)?;
        writer.write_u64::<LittleEndian>(self.data.len() as u64)?;
        write_u64_slice(writer, &self.data)
    }
}

impl ReaderFrom for SecretKey {
    fn read_from<R: Read>(&mut self, reader: &mut R) -> IoResult<()> {
        let parms_id: ParmsId = ParmsId::read_from(reader)?;
        let len: usize = read_count(reader, "secret key coefficient")?;
        let data: Vec<u64> = read_u64_vec(reader, len)?;
        *self = SecretKey { data, parms_id };
        Ok(())
    }
}

/// Encryption of zero under the secret key, in coefficient form at the key
/// level.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PublicKey {
    data: Ciphertext,
}

impl PublicKey {
    pub fn parms_id(&self) -> ParmsId {
        self.data.parms_id()
    }

    pub(crate) fn ciphertext(&self) -> &Ciphertext {
        &self.data
    }

    pub fn validate(&mut self, context: &Context) -> Result<()> {
        self.data.validate(context)?;
        if self.data.parms_id() != context.key_parms_id() || self.data.size() != 2 {
            return Err(NativeFault::invalid_argument("public key is not valid for encryption parameters"));
        }
        Ok(())
    }
}

impl WriterTo for PublicKey {
    fn write_to<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        self.data.write_to(writer)
    }
}

impl ReaderFrom for PublicKey {
    fn read_from<R: Read>(&mut self, reader: &mut R) -> IoResult<()> {
        self.data.read_from(reader)
    }
}

pub struct KeyGenerator {
    context: Arc<Context>,
    secret_key: SecretKey,
    source: Source,
}

impl KeyGenerator {
    pub fn new(context: Arc<Context>) -> Result<KeyGenerator> {
        Self::with_source(context, Source::from_entropy())
    }

    pub fn with_source(context: Arc<Context>, mut source: Source) -> Result<KeyGenerator> {
        context.require_set()?;
        let key: &Arc<ContextData> = context.key_context_data();
        let n: usize = key.poly_modulus_degree();
        let mut data: Vec<u64> = poly::sample(Distribution::Ternary, &mut source, n, &key.moduli());
        poly::forward(&mut data, key.ntt_tables());
        let secret_key: SecretKey = SecretKey {
            data,
            parms_id: key.parms_id(),
        };
        log::debug!("generated secret key at {:?}", secret_key.parms_id);
        Ok(KeyGenerator {
            context,
            secret_key,
            source,
        })
    }

    pub fn with_secret_key(context: Arc<Context>, secret_key: &SecretKey) -> Result<KeyGenerator> {
        secret_key.validate(&context)?;
        Ok(KeyGenerator {
            context,
            secret_key: secret_key.clone(),
            source: Source::from_entropy(),
        })
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    /// `(-(a*s + e), a)` for uniform `a` and error `e`.
    pub fn create_public_key(&mut self) -> PublicKey {
        let key: &Arc<ContextData> = self.context.key_context_data();
        let n: usize = key.poly_modulus_degree();
        let moduli: Vec<u64> = key.moduli();

        let a_ntt: Vec<u64> = poly::uniform(&mut self.source, n, &moduli);
        let mut a: Vec<u64> = a_ntt.clone();
        poly::backward(&mut a, key.ntt_tables());

        let mut b: Vec<u64> = a_ntt;
        poly::mul_assign(&mut b, &self.secret_key.data, n, &moduli);
        poly::backward(&mut b, key.ntt_tables());
        let e: Vec<u64> = poly::sample(Distribution::error(), &mut self.source, n, &moduli);
        poly::add_assign(&mut b, &e, n, &moduli);
        poly::neg_assign(&mut b, n, &moduli);

        let data: Vec<u64> = [b, a].concat();
        PublicKey {
            data: Ciphertext::from_parts(key, self.context.key_parms_id(), 2, data, 1.0),
        }
    }
}
