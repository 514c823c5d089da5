// Constants for the input planes
pub const BOARD_HEIGHT: i64 = 8;
pub const BOARD_WIDTH: i64 = 8;

pub const NUM_PIECE_PLANES: i64 = 12; // 6 piece types x 2 colors
pub const NUM_REPETITION_PLANES: i64 = 2;
pub const NUM_POCKET_PLANES: i64 = 10; // 5 droppable piece types x 2 colors
pub const NUM_PROMOTED_PIECE_PLANES: i64 = 2;
pub const NUM_EN_PASSANT_PLANES: i64 = 1;
pub const NUM_COLOR_PLANES: i64 = 1;
pub const NUM_TOTAL_MOVE_PLANES: i64 = 1;
pub const NUM_CASTLING_PLANES: i64 = 4;
pub const NUM_NO_PROGRESS_PLANES: i64 = 1;

pub const NUM_INPUT_PLANES: i64 = NUM_PIECE_PLANES
    + NUM_REPETITION_PLANES
    + NUM_POCKET_PLANES
    + NUM_PROMOTED_PIECE_PLANES
    + NUM_EN_PASSANT_PLANES
    + NUM_COLOR_PLANES
    + NUM_TOTAL_MOVE_PLANES
    + NUM_CASTLING_PLANES
    + NUM_NO_PROGRESS_PLANES; // 34 8x8 planes

// Constants for the policy map
pub const NUM_QUEEN_LIKE_MOVES: i64 = 56; // 8 directions x 7 distances
pub const NUM_KNIGHT_MOVES: i64 = 8;
pub const NUM_UNDERPROMOTIONS: i64 = 9; // 3 directions x (knight, bishop, rook)
pub const NUM_QUEEN_PROMOTIONS: i64 = 3;
pub const NUM_DROP_PLANES: i64 = 5;

pub const NUM_POLICY_PLANES: i64 = NUM_QUEEN_LIKE_MOVES
    + NUM_KNIGHT_MOVES
    + NUM_UNDERPROMOTIONS
    + NUM_QUEEN_PROMOTIONS
    + NUM_DROP_PLANES; // 81
pub const NUM_POLICY_MAP_LABELS: i64 = NUM_POLICY_PLANES * BOARD_HEIGHT * BOARD_WIDTH; // 5184
pub const NUM_FLAT_POLICY_LABELS: i64 = 4992;

// Body defaults
pub const DEFAULT_CHANNELS: i64 = 256;
pub const DEFAULT_CHANNELS_OPERATING_INIT: i64 = 128;
pub const DEFAULT_CHANNEL_EXPANSION: i64 = 64;
pub const DEFAULT_DROPOUT_RATE: f64 = 0.15;
pub const DEFAULT_SE_RATIO: i64 = 4;

// Head defaults
pub const DEFAULT_CHANNELS_VALUE_HEAD: i64 = 32;
pub const DEFAULT_VALUE_KERNEL_SIZE: i64 = 1;
pub const DEFAULT_VALUE_FC_SIZE: i64 = 128;
pub const VALUE_MIX_CONV_KERNELS: [i64; 4] = [3, 5, 7, 9];
pub const POLICY_KERNEL_SIZE: i64 = 3;

// Gradient scaling for the two output layers
pub const DEFAULT_GRAD_SCALE_VALUE: f64 = 0.01;
pub const DEFAULT_GRAD_SCALE_POLICY: f64 = 1.0;

// Batch norm settings of the reference graph
pub const BN_EPSILON: f64 = 1e-3;
pub const BN_MOMENTUM: f64 = 0.1;

// Activation shape parameters
pub const HARD_SIGMOID_SLOPE: f64 = 0.2;
pub const HARD_SIGMOID_OFFSET: f64 = 0.5;
pub const LEAKY_RELU_SLOPE: f64 = 0.25;
