//! # 显示空间几何模块
//!
//! ## 设计思路
//!
//! 选区坐标一律使用“显示空间”（CSS 缩放后）像素，与渲染层看到的一致；
//! 只有在采样重绘时才通过 `ScaleFactors` 映射回源分辨率。
//! 拖拽选区支持四角/四边手柄与整体平移，并在每帧更新时：
//! 1. 按配置的宽高比约束修正尺寸
//! 2. 夹取到显示边界内，保证宽高恒 ≥ 0
//!
//! ## 实现思路
//!
//! - `CropRegion` / `DisplaySize` / `ScaleFactors` 为纯数据 + 纯函数，便于属性测试。
//! - `CropSelection` 仅保存当前拖拽会话的瞬态状态，确认或重选即清空。
//! - 比例约束统一走“先定主导边，再反推另一边，超界则回缩”的路径，
//!   任何情况下不产生越界或负尺寸选区。

use super::CropError;

/// 显示空间裁剪选区（CSS 缩放后像素坐标）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRegion {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// 夹取到 `bounds` 内，保证坐标与尺寸均非负且不越界。
    pub fn clamped_to(&self, bounds: DisplaySize) -> Self {
        let x = self.x.clamp(0.0, bounds.width);
        let y = self.y.clamp(0.0, bounds.height);
        let width = self.width.max(0.0).min(bounds.width - x);
        let height = self.height.max(0.0).min(bounds.height - y);
        Self { x, y, width, height }
    }

    /// 产物输出尺寸：显示空间宽高取整，至少 1 像素。
    pub fn output_size(&self) -> (u32, u32) {
        let width = (self.width.round() as u32).max(1);
        let height = (self.height.round() as u32).max(1);
        (width, height)
    }

    /// 选区是否达到可用的最小尺寸。
    pub fn is_usable(&self, min_size: f32) -> bool {
        self.width >= min_size && self.height >= min_size
    }
}

/// 预览在渲染层的显示尺寸（显示空间像素）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    pub width: f32,
    pub height: f32,
}

impl DisplaySize {
    pub fn new(width: f32, height: f32) -> Result<Self, CropError> {
        if !(width > 0.0) || !(height > 0.0) {
            return Err(CropError::InvalidState(format!(
                "显示尺寸必须为正数：{}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }
}

/// 缩放因子：源图自然分辨率 ÷ 显示分辨率。
///
/// 选区以显示空间表达，采样必须按源分辨率取像素，二者通过本类型换算。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub scale_x: f32,
    pub scale_y: f32,
}

impl ScaleFactors {
    /// 按“自然尺寸 ÷ 显示尺寸”计算缩放因子，每次预览加载后计算一次。
    pub fn compute(
        natural_width: u32,
        natural_height: u32,
        display: DisplaySize,
    ) -> Result<Self, CropError> {
        if natural_width == 0 || natural_height == 0 {
            return Err(CropError::InvalidState(format!(
                "源图尺寸异常：{}x{}",
                natural_width, natural_height
            )));
        }
        Ok(Self {
            scale_x: natural_width as f32 / display.width,
            scale_y: natural_height as f32 / display.height,
        })
    }

    /// 将显示空间选区映射为源分辨率采样矩形 `(x, y, width, height)`。
    pub fn source_rect(&self, region: &CropRegion) -> (u32, u32, u32, u32) {
        let x = (region.x * self.scale_x).round().max(0.0) as u32;
        let y = (region.y * self.scale_y).round().max(0.0) as u32;
        let width = ((region.width * self.scale_x).round() as u32).max(1);
        let height = ((region.height * self.scale_y).round() as u32).max(1);
        (x, y, width, height)
    }
}

/// 拖拽手柄类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragHandle {
    /// 无手柄：从空白处拉出新选区。
    #[default]
    None,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
    /// 整体平移。
    Move,
}

/// 裁剪选区拖拽状态。
///
/// 仅在当前编辑会话内存活；确认、取消或重新选择文件时整体清空。
#[derive(Debug, Clone, Default)]
pub struct CropSelection {
    pub region: Option<CropRegion>,
    pub is_dragging: bool,
    pub drag_handle: DragHandle,
    drag_start: Option<(f32, f32)>,
    drag_start_region: Option<CropRegion>,
}

impl CropSelection {
    /// 从空白处开始拉出新选区。
    pub fn start_new_selection(&mut self, x: f32, y: f32) {
        self.region = Some(CropRegion::new(x, y, 0.0, 0.0));
        self.is_dragging = true;
        self.drag_handle = DragHandle::None;
        self.drag_start = Some((x, y));
        self.drag_start_region = None;
    }

    /// 在已有选区上开始手柄拖拽。
    pub fn start_handle_drag(&mut self, handle: DragHandle, x: f32, y: f32) {
        self.is_dragging = true;
        self.drag_handle = handle;
        self.drag_start = Some((x, y));
        self.drag_start_region = self.region;
    }

    /// 每帧拖拽更新：按手柄语义改变选区，再做比例约束与边界夹取。
    pub fn update_drag(
        &mut self,
        x: f32,
        y: f32,
        bounds: DisplaySize,
        aspect: Option<f32>,
        min_size: f32,
    ) {
        if !self.is_dragging {
            return;
        }

        match self.drag_handle {
            DragHandle::None => {
                if let Some((start_x, start_y)) = self.drag_start {
                    self.region = Some(span_from_anchor(
                        start_x, start_y, x, y, bounds, aspect,
                    ));
                }
            }
            DragHandle::Move => {
                if let (Some((start_x, start_y)), Some(start)) =
                    (self.drag_start, self.drag_start_region)
                {
                    let dx = x - start_x;
                    let dy = y - start_y;
                    // 选区比显示面还大时上限为负，夹取上限不得低于 0。
                    let max_x = (bounds.width - start.width).max(0.0);
                    let max_y = (bounds.height - start.height).max(0.0);
                    let new_x = (start.x + dx).clamp(0.0, max_x);
                    let new_y = (start.y + dy).clamp(0.0, max_y);
                    self.region = Some(CropRegion::new(new_x, new_y, start.width, start.height));
                }
            }
            handle => {
                if let (Some((start_x, start_y)), Some(start)) =
                    (self.drag_start, self.drag_start_region)
                {
                    let dx = x - start_x;
                    let dy = y - start_y;
                    self.region = Some(resize_region(
                        handle, start, dx, dy, bounds, aspect, min_size,
                    ));
                }
            }
        }
    }

    /// 结束本次拖拽，保留选区结果。
    pub fn end_drag(&mut self) {
        self.is_dragging = false;
        self.drag_start = None;
        self.drag_start_region = None;
    }

    /// 清空全部拖拽状态与选区。
    pub fn reset(&mut self) {
        self.region = None;
        self.is_dragging = false;
        self.drag_handle = DragHandle::None;
        self.drag_start = None;
        self.drag_start_region = None;
    }

    /// 取出可用的最终选区（尺寸达标才算有效）。
    pub fn finalized(&self, min_size: f32) -> Option<CropRegion> {
        self.region.filter(|region| region.is_usable(min_size))
    }
}

/// 以锚点为固定角、指针为活动角生成选区。
///
/// 带比例约束时以主导边定尺寸，另一边反推；超出边界时整体回缩，
/// 保证选区始终落在 `bounds` 内。
fn span_from_anchor(
    anchor_x: f32,
    anchor_y: f32,
    pointer_x: f32,
    pointer_y: f32,
    bounds: DisplaySize,
    aspect: Option<f32>,
) -> CropRegion {
    // 锚点与指针都夹取到显示边界内，锚点越界时选区不得随之越界。
    let anchor_x = anchor_x.clamp(0.0, bounds.width);
    let anchor_y = anchor_y.clamp(0.0, bounds.height);
    let pointer_x = pointer_x.clamp(0.0, bounds.width);
    let pointer_y = pointer_y.clamp(0.0, bounds.height);
    let dx = pointer_x - anchor_x;
    let dy = pointer_y - anchor_y;

    let Some(ratio) = aspect else {
        let min_x = anchor_x.min(pointer_x).max(0.0);
        let min_y = anchor_y.min(pointer_y).max(0.0);
        let max_x = anchor_x.max(pointer_x).min(bounds.width);
        let max_y = anchor_y.max(pointer_y).min(bounds.height);
        return CropRegion::new(min_x, min_y, max_x - min_x, max_y - min_y);
    };

    let avail_w = if dx >= 0.0 { bounds.width - anchor_x } else { anchor_x };
    let avail_h = if dy >= 0.0 { bounds.height - anchor_y } else { anchor_y };

    // 主导边：宽度直接取指针位移，高度位移换算为等效宽度后取较大者。
    let mut width = dx.abs().max(dy.abs() * ratio).min(avail_w);
    let mut height = width / ratio;
    if height > avail_h {
        height = avail_h;
        width = height * ratio;
    }

    let x = if dx >= 0.0 { anchor_x } else { anchor_x - width };
    let y = if dy >= 0.0 { anchor_y } else { anchor_y - height };
    CropRegion::new(x, y, width, height)
}

/// 手柄缩放：先按手柄语义计算活动点/活动边，再按比例约束收敛。
fn resize_region(
    handle: DragHandle,
    start: CropRegion,
    dx: f32,
    dy: f32,
    bounds: DisplaySize,
    aspect: Option<f32>,
    min_size: f32,
) -> CropRegion {
    let right = start.x + start.width;
    let bottom = start.y + start.height;

    match handle {
        DragHandle::TopLeft => {
            span_from_anchor(right, bottom, start.x + dx, start.y + dy, bounds, aspect)
        }
        DragHandle::TopRight => {
            span_from_anchor(start.x, bottom, right + dx, start.y + dy, bounds, aspect)
        }
        DragHandle::BottomLeft => {
            span_from_anchor(right, start.y, start.x + dx, bottom + dy, bounds, aspect)
        }
        DragHandle::BottomRight => {
            span_from_anchor(start.x, start.y, right + dx, bottom + dy, bounds, aspect)
        }
        DragHandle::Top => {
            let new_y = (start.y + dy).max(0.0).min(bottom - min_size);
            let height = bottom - new_y;
            fit_edge(start.x, bottom, height, bounds, aspect, Anchor::BottomLeft)
                .unwrap_or(CropRegion::new(start.x, new_y, start.width, height))
        }
        DragHandle::Bottom => {
            let new_bottom = (bottom + dy).max(start.y + min_size).min(bounds.height);
            let height = new_bottom - start.y;
            fit_edge(start.x, start.y, height, bounds, aspect, Anchor::TopLeft)
                .unwrap_or(CropRegion::new(start.x, start.y, start.width, height))
        }
        DragHandle::Left => {
            let new_x = (start.x + dx).max(0.0).min(right - min_size);
            let width = right - new_x;
            fit_width(right, start.y, width, bounds, aspect, true)
                .unwrap_or(CropRegion::new(new_x, start.y, width, start.height))
        }
        DragHandle::Right => {
            let new_right = (right + dx).max(start.x + min_size).min(bounds.width);
            let width = new_right - start.x;
            fit_width(start.x, start.y, width, bounds, aspect, false)
                .unwrap_or(CropRegion::new(start.x, start.y, width, start.height))
        }
        _ => start,
    }
}

enum Anchor {
    TopLeft,
    BottomLeft,
}

/// 上下边拖拽的比例收敛：高度为主导边，宽度向右扩展。
fn fit_edge(
    x: f32,
    anchor_y: f32,
    height: f32,
    bounds: DisplaySize,
    aspect: Option<f32>,
    anchor: Anchor,
) -> Option<CropRegion> {
    let ratio = aspect?;
    let mut height = height;
    let mut width = height * ratio;
    if x + width > bounds.width {
        width = bounds.width - x;
        height = width / ratio;
    }
    let y = match anchor {
        Anchor::TopLeft => anchor_y,
        Anchor::BottomLeft => anchor_y - height,
    };
    Some(CropRegion::new(x, y, width, height))
}

/// 左右边拖拽的比例收敛：宽度为主导边，高度向下扩展。
fn fit_width(
    anchor_x: f32,
    y: f32,
    width: f32,
    bounds: DisplaySize,
    aspect: Option<f32>,
    anchor_is_right: bool,
) -> Option<CropRegion> {
    let ratio = aspect?;
    let mut width = width;
    let mut height = width / ratio;
    if y + height > bounds.height {
        height = bounds.height - y;
        width = height * ratio;
    }
    let x = if anchor_is_right { anchor_x - width } else { anchor_x };
    Some(CropRegion::new(x, y, width, height))
}
