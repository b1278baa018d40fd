use std::fs::File;
use std::io::{self, Read, Seek, Write};
use std::iter;
use std::path::Path;

use byteorder::{
    LittleEndian,
    ReadBytesExt,
    WriteBytesExt,
};
use ndarray_npy::{
    NpzReader,
    ReadDataError,
    ReadNpyExt,
    ReadableElement,
    WriteNpyExt,
};
use py_literal::Value as PyValue;
use zip::{
    write::FileOptions,
    CompressionMethod,
    ZipWriter,
};
use shared::{
    ndarray as nd,
    bail,
    ensure,
    Context,
    Result,
};


const NPY_MAGIC: &[u8] = b"\x93NUMPY\x01\x00";
const NPY_ALIGN: usize = 64;


/// NumPy fixed-width unicode string (`<U{width}`), stored as `width` little-endian UTF-32 code
/// units with trailing NULs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnicodeStr(String);


impl UnicodeStr {
    pub fn as_str(&self) -> &str { &self.0 }
}


impl ReadableElement for UnicodeStr {
    fn read_to_end_exact_vec<R: io::Read>(mut reader: R, type_desc: &PyValue, len: usize)
        -> Result<Vec<Self>, ReadDataError>
    {
        let width = match type_desc {
            PyValue::String(s) => s.strip_prefix("<U").and_then(|w| w.parse::<usize>().ok()),
            _ => None,
        };
        let width = match width {
            Some(w) => w,
            None => return Err(ReadDataError::WrongDescriptor(type_desc.clone())),
        };

        let mut ret = Vec::with_capacity(len);
        for _ in 0 .. len {
            let mut s = String::with_capacity(width);
            for _ in 0 .. width {
                let code = reader.read_u32::<LittleEndian>()?;
                let c = char::from_u32(code).ok_or_else(|| io::Error::new(
                    io::ErrorKind::InvalidData, format!("Invalid unicode code point {:#x}.", code)))?;
                s.push(c);
            }
            ret.push(Self(s.trim_end_matches('\0').to_string()));
        }

        Ok(ret)
    }
}


/// Write `strings` as a one dimensional NPY array of dtype `<U{width}`, where `width` is the
/// character count of the longest string, at least 1.
pub fn write_unicode_npy<W, S>(mut w: W, strings: &[S]) -> Result<()>
where W: Write,
      S: AsRef<str>,
{
    for s in strings {
        ensure!(!s.as_ref().contains('\0'), "String {:?} contains NUL characters.", s.as_ref());
    }
    let width = strings.iter()
        .map(|s| s.as_ref().chars().count())
        .max()
        .unwrap_or(0)
        .max(1);

    let header = PyValue::Dict(vec![
        (PyValue::String("descr".into()),         PyValue::String(format!("<U{}", width))),
        (PyValue::String("fortran_order".into()), PyValue::Boolean(false)),
        (PyValue::String("shape".into()),         PyValue::Tuple(vec![PyValue::Integer(strings.len().into())])),
    ]);
    let mut dict: Vec<u8> = vec![];
    header.write_ascii(&mut dict)?;

    // magic and version, u16 header length, dict, space padding and '\n'
    let unpadded = NPY_MAGIC.len() + 2 + dict.len() + 1;
    let total = (unpadded + NPY_ALIGN - 1) / NPY_ALIGN * NPY_ALIGN;
    let header_len = u16::try_from(total - NPY_MAGIC.len() - 2)
        .context("NPY header of unicode array is too long.")?;

    w.write_all(NPY_MAGIC)?;
    w.write_u16::<LittleEndian>(header_len)?;
    w.write_all(&dict)?;
    w.write_all(&vec![b' '; total - unpadded])?;
    w.write_all(b"\n")?;

    for s in strings {
        for c in s.as_ref().chars().chain(iter::repeat('\0')).take(width) {
            w.write_u32::<LittleEndian>(c as u32)?;
        }
    }
    w.flush()?;
    Ok(())
}


fn entry_name<R>(npz: &mut NpzReader<R>, field: &str) -> Result<String>
where R: Read + Seek {
    npz.names()?
        .into_iter()
        .find(|n| n == field || n.strip_suffix(".npy") == Some(field))
        .with_context(|| format!("Field {:?} not found in NPZ archive.", field))
}


/// Read a floating point array, widening `f32` storage to `f64`.
fn read_float_field<R, D>(npz: &mut NpzReader<R>, field: &str) -> Result<nd::Array<f64, D>>
where R: Read + Seek,
      D: nd::Dimension,
{
    let name = entry_name(npz, field)?;
    if let Ok(arr) = npz.by_name::<nd::OwnedRepr<f64>, D>(&name) {
        return Ok(arr);
    }
    let arr = npz.by_name::<nd::OwnedRepr<f32>, D>(&name)
        .with_context(|| format!("Field {:?} is neither float64 nor float32 or has wrong dimensions.", field))?;
    Ok(arr.mapv(f64::from))
}


fn read_meta_field<R>(npz: &mut NpzReader<R>, field: &str) -> Result<String>
where R: Read + Seek {
    let name = entry_name(npz, field)?;
    let arr = npz.by_name::<nd::OwnedRepr<UnicodeStr>, nd::Ix1>(&name)
        .with_context(|| format!("Field {:?} is not a unicode string array.", field))?;
    ensure!(arr.len() == 1, "Field {:?} should hold exactly one string, got {}.", field, arr.len());
    Ok(arr[0].as_str().to_string())
}


fn read_atomic_numbers_field<R>(npz: &mut NpzReader<R>) -> Result<nd::Array1<u8>>
where R: Read + Seek {
    let name = entry_name(npz, "z")?;
    if let Ok(z) = npz.by_name::<nd::OwnedRepr<u8>, nd::Ix1>(&name) {
        return Ok(z);
    }

    let wide = match npz.by_name::<nd::OwnedRepr<i64>, nd::Ix1>(&name) {
        Ok(z) => z,
        Err(_) => npz.by_name::<nd::OwnedRepr<i32>, nd::Ix1>(&name)
            .context("Field \"z\" is not an integer array.")?
            .mapv(i64::from),
    };

    wide.iter()
        .map(|&z| u8::try_from(z).with_context(|| format!("Invalid atomic number {} in field \"z\".", z)))
        .collect::<Result<Vec<u8>>>()
        .map(nd::Array1::from)
}


/// Read a `.npy` file holding floating point numbers, widening `f32` storage to `f64`.
pub fn read_npy_f64<P, D>(path: P) -> Result<nd::Array<f64, D>>
where P: AsRef<Path>,
      D: nd::Dimension,
{
    let path = path.as_ref();
    let open = || File::open(path).with_context(|| format!("Failed to open {:?}.", path));

    if let Ok(arr) = nd::Array::<f64, D>::read_npy(open()?) {
        return Ok(arr);
    }
    let arr = nd::Array::<f32, D>::read_npy(open()?)
        .with_context(|| format!("Failed to read {:?} as a float64 or float32 NPY array.", path))?;
    Ok(arr.mapv(f64::from))
}


/// Atomic numbers stored in the `z` field of a dataset archive.
pub fn read_atomic_numbers<P>(path: P) -> Result<Vec<u8>>
where P: AsRef<Path> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("Failed to open {:?}.", path))?;
    let mut npz = NpzReader::new(f)
        .with_context(|| format!("Failed to read {:?} as NPZ archive.", path))?;
    Ok(read_atomic_numbers_field(&mut npz)?.to_vec())
}


/// MD17-style labelled dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct MdDataset {
    pub coords:         nd::Array3<f64>,    // R, [nframes, natoms, 3]
    pub atomic_numbers: nd::Array1<u8>,     // z, [natoms]
    pub energies:       nd::Array2<f64>,    // E, [nframes, 1]
    pub forces:         nd::Array3<f64>,    // F, [nframes, natoms, 3]

    pub name:   String,
    pub theory: String,
    pub kind:   String,     // stored as `type`
    pub md5:    String,
}


impl MdDataset {
    /// Build a dataset without labels: energies and forces are filled with zeros, `type` and `md5`
    /// are `"unknown"`.
    pub fn with_placeholders(coords: nd::Array3<f64>, atomic_numbers: nd::Array1<u8>,
                             name: &str, theory: &str) -> Result<Self> {
        let shape = coords.shape().to_vec();
        ensure!(shape[2] == 3, "Coordinates must be shaped as [nframes, natoms, 3], got {:?}.", shape);
        ensure!(atomic_numbers.len() == shape[1],
            "Mismatch between number of atoms in coordinates ({}) and atomic numbers ({}).",
            shape[1], atomic_numbers.len());

        let (nframes, natoms) = (shape[0], shape[1]);

        Ok(Self {
            coords,
            atomic_numbers,
            energies: nd::Array2::zeros((nframes, 1)),
            forces:   nd::Array3::zeros((nframes, natoms, 3)),
            name:     name.to_string(),
            theory:   theory.to_string(),
            kind:     String::from("unknown"),
            md5:      String::from("unknown"),
        })
    }

    pub fn nframes(&self) -> usize { self.coords.shape()[0] }
    pub fn natoms(&self) -> usize { self.coords.shape()[1] }

    pub fn from_npz<P>(path: P) -> Result<Self>
    where P: AsRef<Path> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("Failed to open {:?}.", path))?;
        let mut npz = NpzReader::new(f)
            .with_context(|| format!("Failed to read {:?} as NPZ archive.", path))?;

        let coords: nd::Array3<f64> = read_float_field(&mut npz, "R")?;
        let atomic_numbers = read_atomic_numbers_field(&mut npz)?;
        let energies: nd::Array2<f64> = read_float_field(&mut npz, "E")?;
        let forces: nd::Array3<f64> = read_float_field(&mut npz, "F")?;

        let name   = read_meta_field(&mut npz, "name")?;
        let theory = read_meta_field(&mut npz, "theory")?;
        let kind   = read_meta_field(&mut npz, "type")?;
        let md5    = read_meta_field(&mut npz, "md5")?;

        if forces.shape() != coords.shape() {
            bail!("Inconsistent shapes of R {:?} and F {:?} in {:?}.", coords.shape(), forces.shape(), path);
        }

        Ok(Self {
            coords,
            atomic_numbers,
            energies,
            forces,
            name,
            theory,
            kind,
            md5,
        })
    }

    /// Write the dataset as a compressed `.npz` archive with entries `R.npy`, `z.npy`, ...
    pub fn save_to_npz<P>(&self, path: P) -> Result<()>
    where P: AsRef<Path> {
        let path = path.as_ref();

        let mut meta = vec![];
        for (field, value) in [("name", &self.name), ("theory", &self.theory), ("type", &self.kind), ("md5", &self.md5)] {
            let mut buf: Vec<u8> = vec![];
            write_unicode_npy(&mut buf, &[value])
                .with_context(|| format!("Invalid value of field {:?}.", field))?;
            meta.push((field, buf));
        }

        let f = File::create(path).with_context(|| format!("Failed to create {:?}.", path))?;
        let mut zip = ZipWriter::new(f);
        let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("R.npy", opts)?;
        self.coords.write_npy(&mut zip)?;
        zip.start_file("z.npy", opts)?;
        self.atomic_numbers.write_npy(&mut zip)?;
        zip.start_file("E.npy", opts)?;
        self.energies.write_npy(&mut zip)?;
        zip.start_file("F.npy", opts)?;
        self.forces.write_npy(&mut zip)?;
        for (field, buf) in meta.iter() {
            zip.start_file(format!("{}.npy", field), opts)?;
            zip.write_all(buf)?;
        }
        zip.finish()?;

        Ok(())
    }
}
