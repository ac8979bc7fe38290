// 構造的ピクセル差分
//
// YIQ色空間での知覚的な色差を使い、閾値を超えたピクセル数を数える。
// アンチエイリアスと判定されたピクセルは差分に含めない。

use image::RgbaImage;

/// YIQ色差の最大値（白と黒の差）
const MAX_YIQ_DELTA: f64 = 35215.0;

/// 2つの同サイズ画像で閾値を超えて異なるピクセル数を数える
///
/// `threshold` は0.0〜1.0の正規化された許容値。サイズが異なる場合は `None`。
pub fn count_diff_pixels(img1: &RgbaImage, img2: &RgbaImage, threshold: f64) -> Option<u64> {
    if img1.dimensions() != img2.dimensions() {
        return None;
    }

    let (width, height) = img1.dimensions();
    let a = img1.as_raw();
    let b = img2.as_raw();

    // 完全一致なら走査不要
    if a == b {
        return Some(0);
    }

    let max_delta = MAX_YIQ_DELTA * threshold * threshold;
    let mut diff = 0u64;

    for y in 0..height {
        for x in 0..width {
            let pos = ((y * width + x) * 4) as usize;
            let delta = color_delta(a, b, pos, pos, false);

            if delta.abs() > max_delta {
                let anti_aliased = is_antialiased(a, x, y, width, height, b)
                    || is_antialiased(b, x, y, width, height, a);
                if !anti_aliased {
                    diff += 1;
                }
            }
        }
    }

    Some(diff)
}

/// 差分ピクセル数から類似度（0〜100）を計算
pub fn similarity_percentage(diff_pixels: u64, total_pixels: u64) -> f64 {
    if total_pixels == 0 {
        return 0.0;
    }
    let score = (total_pixels.saturating_sub(diff_pixels)) as f64 / total_pixels as f64 * 100.0;
    score.clamp(0.0, 100.0)
}

fn rgb2y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.29889531 + g * 0.58662247 + b * 0.11448223
}

fn rgb2i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.59597799 - g * 0.27417610 - b * 0.32180189
}

fn rgb2q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.21147017 - g * 0.52261711 + b * 0.31114694
}

/// 白背景にアルファブレンド
fn blend(c: f64, a: f64) -> f64 {
    255.0 + (c - 255.0) * a
}

fn blended_rgb(img: &[u8], pos: usize) -> (f64, f64, f64) {
    let (r, g, b, a) = (
        img[pos] as f64,
        img[pos + 1] as f64,
        img[pos + 2] as f64,
        img[pos + 3] as f64,
    );
    if a < 255.0 {
        let a = a / 255.0;
        (blend(r, a), blend(g, a), blend(b, a))
    } else {
        (r, g, b)
    }
}

/// 2ピクセル間の色差。符号は明るさの向きを表す
fn color_delta(img1: &[u8], img2: &[u8], k: usize, m: usize, y_only: bool) -> f64 {
    if img1[k..k + 4] == img2[m..m + 4] {
        return 0.0;
    }

    let (r1, g1, b1) = blended_rgb(img1, k);
    let (r2, g2, b2) = blended_rgb(img2, m);

    let y1 = rgb2y(r1, g1, b1);
    let y2 = rgb2y(r2, g2, b2);
    let y = y1 - y2;

    if y_only {
        return y;
    }

    let i = rgb2i(r1, g1, b1) - rgb2i(r2, g2, b2);
    let q = rgb2q(r1, g1, b1) - rgb2q(r2, g2, b2);
    let delta = 0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q;

    if y1 > y2 {
        -delta
    } else {
        delta
    }
}

fn neighborhood(x: u32, y: u32, width: u32, height: u32) -> (u32, u32, u32, u32) {
    (
        x.saturating_sub(1),
        y.saturating_sub(1),
        (x + 1).min(width - 1),
        (y + 1).min(height - 1),
    )
}

/// ピクセルがアンチエイリアスの一部かどうか
fn is_antialiased(img: &[u8], x1: u32, y1: u32, width: u32, height: u32, other: &[u8]) -> bool {
    let (x0, y0, x2, y2) = neighborhood(x1, y1, width, height);
    let pos = ((y1 * width + x1) * 4) as usize;

    let mut zeroes = if x1 == x0 || x1 == x2 || y1 == y0 || y1 == y2 {
        1
    } else {
        0
    };
    let mut min = 0.0;
    let mut max = 0.0;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (0, 0, 0, 0);

    for x in x0..=x2 {
        for y in y0..=y2 {
            if x == x1 && y == y1 {
                continue;
            }

            let delta = color_delta(img, img, pos, ((y * width + x) * 4) as usize, true);
            if delta == 0.0 {
                zeroes += 1;
                // 同色の隣接ピクセルが多ければエッジではない
                if zeroes > 2 {
                    return false;
                }
            } else if delta < min {
                min = delta;
                min_x = x;
                min_y = y;
            } else if delta > max {
                max = delta;
                max_x = x;
                max_y = y;
            }
        }
    }

    // 暗い側と明るい側の両方の隣接がなければアンチエイリアスではない
    if min == 0.0 || max == 0.0 {
        return false;
    }

    (has_many_siblings(img, min_x, min_y, width, height)
        && has_many_siblings(other, min_x, min_y, width, height))
        || (has_many_siblings(img, max_x, max_y, width, height)
            && has_many_siblings(other, max_x, max_y, width, height))
}

/// 同色の隣接ピクセルが3つ以上あるか
fn has_many_siblings(img: &[u8], x1: u32, y1: u32, width: u32, height: u32) -> bool {
    let (x0, y0, x2, y2) = neighborhood(x1, y1, width, height);
    let pos = ((y1 * width + x1) * 4) as usize;

    let mut zeroes = if x1 == x0 || x1 == x2 || y1 == y0 || y1 == y2 {
        1
    } else {
        0
    };

    for x in x0..=x2 {
        for y in y0..=y2 {
            if x == x1 && y == y1 {
                continue;
            }

            let pos2 = ((y * width + x) * 4) as usize;
            if img[pos..pos + 4] == img[pos2..pos2 + 4] {
                zeroes += 1;
            }
            if zeroes > 2 {
                return true;
            }
        }
    }

    false
}
