use crate::Idx2d;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use ndarray::{Array2, ArrayView2};
use std::io::{self, Read, Write};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 压缩存储的二值掩膜; 不透明类型.
///
/// 像素按行优先顺序每 8 个打包为 1 字节 (高位在前), 再以 zlib 压缩.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompactMask {
    /// 压缩的不透明字节流.
    buf: Vec<u8>,

    /// 形状.
    sh: Idx2d,
}

impl CompactMask {
    /// 压缩数据.
    pub(crate) fn from_view(data: ArrayView2<'_, bool>) -> Self {
        let mut packed = vec![0u8; data.len().div_ceil(8)];
        for (i, _) in data.iter().enumerate().filter(|&(_, &p)| p) {
            packed[i / 8] |= 0x80 >> (i % 8);
        }
        let mut e = ZlibEncoder::new(Vec::with_capacity(8), Compression::best());
        e.write_all(&packed).expect("Compression error");
        Self {
            buf: e.finish().expect("Compression error"),
            sh: data.dim(),
        }
    }

    /// 掩膜形状 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.sh
    }

    /// 压缩后的字节数.
    #[inline]
    pub fn compressed_len(&self) -> usize {
        self.buf.len()
    }

    /// 解压缩数据.
    ///
    /// # 返回值
    ///
    /// 字节流损坏或长度与形状不符时返回 `io::Error`.
    pub fn decompress(&self) -> io::Result<Array2<bool>> {
        let (h, w) = self.sh;
        let n = h * w;
        let mut packed = Vec::with_capacity(n.div_ceil(8));
        let mut decoder = ZlibDecoder::new(self.buf.as_slice());
        decoder.read_to_end(&mut packed)?;
        if packed.len() != n.div_ceil(8) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "packed mask holds {} bytes, shape {:?} needs {}",
                    packed.len(),
                    self.sh,
                    n.div_ceil(8)
                ),
            ));
        }
        let bits = (0..n)
            .map(|i| packed[i / 8] & (0x80 >> (i % 8)) != 0)
            .collect();
        Array2::from_shape_vec((h, w), bits)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use crate::{InteriorRoi, PhantomMask};
    use ndarray::Array2;

    #[test]
    fn test_compress_odd_shape() {
        // 7x3 = 21 像素, 不是 8 的整数倍.
        let data = Array2::from_shape_fn((7, 3), |(h, w)| (h * 3 + w) % 3 == 0 || h == 6);
        let mask = PhantomMask::new(data.clone());
        let compact = mask.compress();
        assert_eq!(compact.shape(), (7, 3));
        assert_eq!(PhantomMask::from_compact(&compact).unwrap(), mask);
        let roi = InteriorRoi::from_compact(&compact).unwrap();
        assert_eq!(roi.into_raw(), data);
    }

    #[test]
    fn test_compress_large_uniform_mask_is_small() {
        let roi = InteriorRoi::empty((256, 256));
        let compact = roi.compress();
        assert!(compact.compressed_len() < 256 * 256 / 8 / 10);
        assert!(InteriorRoi::from_compact(&compact).unwrap().is_empty());
    }

    #[test]
    fn test_corrupted_stream() {
        let mut compact = PhantomMask::empty((4, 4)).compress();
        compact.buf.truncate(2);
        assert!(compact.decompress().is_err());
    }
}
