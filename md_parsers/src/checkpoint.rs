//! Model checkpoints stored as safetensors files.
//!
//! Every tensor of the file becomes a [`ParamValue::Tensor`], decoded to `f64`, and every entry of
//! the free-form `__metadata__` header becomes a [`ParamValue::Scalar`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use half::{bf16, f16};
use safetensors::{
    Dtype,
    SafeTensors,
    tensor::TensorView,
};
use shared::{
    bail,
    ensure,
    Context,
    Result,
};


#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    pub dtype: String,
    pub shape: Vec<usize>,
    pub data:  Vec<f64>,
}


impl Tensor {
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        ensure!(shape.iter().product::<usize>() == data.len(),
            "Tensor of shape {:?} cannot hold {} elements.", shape, data.len());
        Ok(Self { dtype: String::from("F64"), shape, data })
    }

    pub fn numel(&self) -> usize { self.data.len() }
}


#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Tensor(Tensor),
    Scalar(String),
}


impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Tensor(t) => write!(f, "tensor {} {}", t.dtype, shared::shape_str(&t.shape)),
            ParamValue::Scalar(s) => write!(f, "{:?}", s),
        }
    }
}


/// Mapping from parameter name to its stored value, ordered by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterMapping {
    pub params: BTreeMap<String, ParamValue>,
}


fn decode_tensor(view: &TensorView) -> Result<Tensor> {
    let bytes = view.data();
    let data: Vec<f64> = match view.dtype() {
        Dtype::F64  => bytes.chunks_exact(8).map(LittleEndian::read_f64).collect(),
        Dtype::F32  => bytes.chunks_exact(4).map(|b| LittleEndian::read_f32(b) as f64).collect(),
        Dtype::F16  => bytes.chunks_exact(2).map(|b| f16::from_bits(LittleEndian::read_u16(b)).to_f64()).collect(),
        Dtype::BF16 => bytes.chunks_exact(2).map(|b| bf16::from_bits(LittleEndian::read_u16(b)).to_f64()).collect(),
        Dtype::I64  => bytes.chunks_exact(8).map(|b| LittleEndian::read_i64(b) as f64).collect(),
        Dtype::I32  => bytes.chunks_exact(4).map(|b| LittleEndian::read_i32(b) as f64).collect(),
        Dtype::I16  => bytes.chunks_exact(2).map(|b| LittleEndian::read_i16(b) as f64).collect(),
        Dtype::I8   => bytes.iter().map(|&b| b as i8 as f64).collect(),
        Dtype::U8   => bytes.iter().map(|&b| b as f64).collect(),
        Dtype::BOOL => bytes.iter().map(|&b| if b != 0 { 1.0 } else { 0.0 }).collect(),
        other => bail!("Unsupported tensor dtype {:?}.", other),
    };

    Tensor::new(view.shape().to_vec(), data)
        .map(|t| Tensor { dtype: format!("{:?}", view.dtype()), ..t })
}


impl ParameterMapping {
    pub fn len(&self) -> usize { self.params.len() }
    pub fn is_empty(&self) -> bool { self.params.is_empty() }
    pub fn get(&self, key: &str) -> Option<&ParamValue> { self.params.get(key) }
    pub fn keys(&self) -> impl Iterator<Item=&String> { self.params.keys() }

    pub fn from_bytes(buffer: &[u8]) -> Result<Self> {
        let st = SafeTensors::deserialize(buffer)?;
        let (_, header) = SafeTensors::read_metadata(buffer)?;

        let mut params = BTreeMap::new();
        for (name, view) in st.tensors() {
            let tensor = decode_tensor(&view)
                .with_context(|| format!("Failed to decode tensor {:?}.", name))?;
            params.insert(name, ParamValue::Tensor(tensor));
        }

        if let Some(meta) = header.metadata() {
            for (key, value) in meta.iter() {
                ensure!(!params.contains_key(key),
                    "Metadata entry {:?} collides with a tensor of the same name.", key);
                params.insert(key.clone(), ParamValue::Scalar(value.clone()));
            }
        }

        Ok(Self { params })
    }

    pub fn from_file<P>(path: P) -> Result<Self>
    where P: AsRef<Path> {
        let path = path.as_ref();
        let buffer = fs::read(path)
            .with_context(|| format!("Failed to read checkpoint {:?}.", path))?;
        Self::from_bytes(&buffer)
            .with_context(|| format!("Failed to parse {:?} as safetensors checkpoint.", path))
    }

    /// Serialize as safetensors, tensors are stored as `F64`.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffers = vec![];
        let mut meta = HashMap::new();

        for (key, value) in self.params.iter() {
            match value {
                ParamValue::Tensor(t) => {
                    let mut buf = vec![0u8; t.numel() * 8];
                    LittleEndian::write_f64_into(&t.data, &mut buf);
                    buffers.push((key.as_str(), t.shape.clone(), buf));
                },
                ParamValue::Scalar(s) => {
                    meta.insert(key.clone(), s.clone());
                },
            }
        }

        let views = buffers.iter()
            .map(|(key, shape, buf)| Ok((*key, TensorView::new(Dtype::F64, shape.clone(), buf)?)))
            .collect::<Result<Vec<_>>>()?;
        let meta = if meta.is_empty() { None } else { Some(meta) };

        Ok(safetensors::serialize(views, &meta)?)
    }

    pub fn save_to_file<P>(&self, path: P) -> Result<()>
    where P: AsRef<Path> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes()?)
            .with_context(|| format!("Failed to write checkpoint {:?}.", path))
    }
}


impl FromIterator<(String, ParamValue)> for ParameterMapping {
    fn from_iter<I: IntoIterator<Item=(String, ParamValue)>>(iter: I) -> Self {
        Self { params: iter.into_iter().collect() }
    }
}
