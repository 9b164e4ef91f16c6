use crate::{error::MnistError, network::Example};
use flate2::read::GzDecoder;
use itertools::Itertools;
use log::info;
use ndarray::Array1;
use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
};

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;
const DIGITS: usize = 10;

// Each data file may be shipped gzipped (as distributed) or already unpacked, under either of the
// two naming conventions in common use. The first existing candidate wins.
const TRAIN_IMAGES: [&str; 3] = [
    "train-images-idx3-ubyte.gz",
    "train-images-idx3-ubyte",
    "train-images.idx3-ubyte",
];
const TRAIN_LABELS: [&str; 3] = [
    "train-labels-idx1-ubyte.gz",
    "train-labels-idx1-ubyte",
    "train-labels.idx1-ubyte",
];
const TEST_IMAGES: [&str; 3] = [
    "t10k-images-idx3-ubyte.gz",
    "t10k-images-idx3-ubyte",
    "t10k-images.idx3-ubyte",
];
const TEST_LABELS: [&str; 3] = [
    "t10k-labels-idx1-ubyte.gz",
    "t10k-labels-idx1-ubyte",
    "t10k-labels.idx1-ubyte",
];

/// The decoded contents of an IDX image file: `count` images of `rows x columns` pixels, stored
/// row by row, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Images {
    pub count: usize,
    pub rows: usize,
    pub columns: usize,
    pub pixels: Vec<u8>,
}

/// The MNIST training set split into training and validation examples, plus the test set.
pub struct MnistData {
    pub training: Vec<Example>,
    pub validation: Vec<Example>,
    pub test: Vec<Example>,
    /// Pixels per image row, as declared by the training image file.
    pub columns: usize,
}

impl MnistData {
    /// Loads the four MNIST files from `dir`. The last `validation_size` training examples are
    /// held out as the validation set.
    pub fn load(dir: &Path, validation_size: usize) -> Result<MnistData, MnistError> {
        let (mut training, columns) =
            load_examples(&locate(dir, &TRAIN_IMAGES), &locate(dir, &TRAIN_LABELS))?;
        if validation_size > training.len() {
            return Err(MnistError::ValidationTooLarge {
                requested: validation_size,
                available: training.len(),
            });
        }
        let validation = training.split_off(training.len() - validation_size);
        let (test, _) = load_examples(&locate(dir, &TEST_IMAGES), &locate(dir, &TEST_LABELS))?;

        info!(
            "loaded MNIST from {}: {} training, {} validation, {} test examples",
            dir.display(),
            training.len(),
            validation.len(),
            test.len()
        );

        Ok(MnistData {
            training,
            validation,
            test,
            columns,
        })
    }
}

/// Reads a pair of IDX image and label files into one-hot labelled examples with pixel values
/// scaled into [0, 1]. Also returns the width of the images in pixels.
pub fn load_examples(
    images_path: &Path,
    labels_path: &Path,
) -> Result<(Vec<Example>, usize), MnistError> {
    let images = parse_images(images_path, &read_bytes(images_path)?)?;
    let labels = parse_labels(labels_path, &read_bytes(labels_path)?)?;
    Ok((examples_from(&images, &labels)?, images.columns))
}

// Picks the first candidate file name that exists in `dir`. When none does, the first candidate
// is returned so the open error names the conventional file.
fn locate(dir: &Path, candidates: &[&str]) -> PathBuf {
    candidates
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
        .unwrap_or_else(|| dir.join(candidates[0]))
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, MnistError> {
    let io_error = |source| MnistError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    let gzipped = path.extension().is_some_and(|extension| extension == "gz");
    decode(file, gzipped).map_err(io_error)
}

fn decode<R: Read>(mut reader: R, gzipped: bool) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    if gzipped {
        GzDecoder::new(reader).read_to_end(&mut bytes)?;
    } else {
        reader.read_to_end(&mut bytes)?;
    }
    Ok(bytes)
}

// Reads `fields` big-endian u32 header values, checking the first one against `magic`. Returns
// the remaining header fields and the payload after the header.
fn read_header<'a>(
    path: &Path,
    bytes: &'a [u8],
    magic: u32,
    fields: usize,
) -> Result<(Vec<usize>, &'a [u8]), MnistError> {
    if bytes.len() < fields * 4 {
        return Err(MnistError::Truncated {
            path: path.to_path_buf(),
        });
    }
    let (header, payload) = bytes.split_at(fields * 4);
    let mut values = header
        .chunks_exact(4)
        .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));

    let actual = values.next().unwrap_or_default();
    if actual != magic {
        return Err(MnistError::InvalidMagic {
            path: path.to_path_buf(),
            expected: magic,
            actual,
        });
    }

    Ok((values.map(|value| value as usize).collect(), payload))
}

/// Decodes an IDX3 image file: magic number 2051, then the image count, the rows per image and the
/// columns per image, followed by the pixels.
pub fn parse_images(path: &Path, bytes: &[u8]) -> Result<Images, MnistError> {
    let (header, payload) = read_header(path, bytes, IMAGES_MAGIC, 4)?;
    let (count, rows, columns) = (header[0], header[1], header[2]);

    let len = pixel_count(count, rows, columns)?;
    let pixels = payload.get(..len).ok_or_else(|| MnistError::Truncated {
        path: path.to_path_buf(),
    })?;

    Ok(Images {
        count,
        rows,
        columns,
        pixels: pixels.to_vec(),
    })
}

// Total pixels across all images. Header values come straight from the file, so the product is
// checked rather than trusted, and a file that declares images must give them at least one pixel.
fn pixel_count(count: usize, rows: usize, columns: usize) -> Result<usize, MnistError> {
    let invalid = MnistError::InvalidDimensions {
        count,
        rows,
        columns,
    };
    if count > 0 && (rows == 0 || columns == 0) {
        return Err(invalid);
    }
    count
        .checked_mul(rows)
        .and_then(|n| n.checked_mul(columns))
        .ok_or(invalid)
}

/// Decodes an IDX1 label file: magic number 2049, then the label count, followed by one byte per
/// label.
pub fn parse_labels(path: &Path, bytes: &[u8]) -> Result<Vec<u8>, MnistError> {
    let (header, payload) = read_header(path, bytes, LABELS_MAGIC, 2)?;
    let count = header[0];

    payload
        .get(..count)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| MnistError::Truncated {
            path: path.to_path_buf(),
        })
}

/// Pairs every image with its label.
pub fn examples_from(images: &Images, labels: &[u8]) -> Result<Vec<Example>, MnistError> {
    if images.count != labels.len() {
        return Err(MnistError::CountMismatch {
            images: images.count,
            labels: labels.len(),
        });
    }

    // `Images` can be built by hand, so its dimensions get the same checks as a parsed header,
    // and the pixel buffer has to hold exactly that many pixels. itertools' `chunks` panics on a
    // chunk size of 0, which only an empty image set could still reach here.
    let len = pixel_count(images.count, images.rows, images.columns)?;
    if images.pixels.len() != len {
        return Err(MnistError::InvalidDimensions {
            count: images.count,
            rows: images.rows,
            columns: images.columns,
        });
    }
    if images.count == 0 {
        return Ok(Vec::new());
    }

    let chunks = images.pixels.iter().chunks(images.rows * images.columns);

    chunks
        .into_iter()
        .zip(labels)
        .enumerate()
        .map(|(index, (image, &label))| {
            if usize::from(label) >= DIGITS {
                return Err(MnistError::InvalidLabel { index, label });
            }
            let input: Array1<f64> = image.map(|&pixel| f64::from(pixel) / 255.0).collect();
            Ok(Example::one_hot(input, label.into(), DIGITS))
        })
        .collect()
}

/// Draws an example as shaded text, `columns` pixels per line, followed by its label.
pub fn render_ascii(example: &Example, columns: usize) -> String {
    let columns = columns.max(1);
    let mut picture = example
        .input
        .iter()
        .chunks(columns)
        .into_iter()
        .map(|row| row.map(|&intensity| shade(intensity)).collect::<String>())
        .join("\n");

    picture.push_str(&format!("\nAnswer: {}", example.label()));
    picture
}

fn shade(intensity: f64) -> char {
    match intensity {
        a if a < 0.2 => ' ',
        a if a < 0.4 => '░',
        a if a < 0.6 => '▒',
        a if a < 0.8 => '▓',
        _ => '█',
    }
}
