pub mod bounding_box;
pub mod category_index;
pub mod coco;
pub mod normalize;
