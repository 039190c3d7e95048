//! The sample program: a lost update on `x` racing a write to `y`.

pub const PRELUDE: &str = "let x = 1, y = 2;\n";

pub const THREADS: [&str; 2] = [
    "// One line is one \"instruction\". Multiline if/for/while not supported.\n\
     // x += y\n\
     let tmp0 = x;\n\
     let tmp1 = y;\n\
     tmp0 += tmp1;\n\
     x = tmp0;\n",
    "y = 3;\n",
];

pub const EPILOGUE: &str = "return [x, y];\n";
